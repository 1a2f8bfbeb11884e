//! Name mapping between Kubernetes JSON fields and Terraform attributes

/// Convert a camelCase (or dotted/dashed) field name to snake_case
///
/// Acronym runs stay together (`HTTPServer` becomes `http_server`) and a
/// plural `s` directly after an acronym is kept with it (`URIs` becomes `uris`).
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let after_next = chars.get(i + 2).copied();

            let starts_word = if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                true
            } else if prev.is_ascii_uppercase() {
                match next {
                    Some('s') => after_next.is_some_and(|a| a.is_ascii_lowercase()),
                    Some(n) => n.is_ascii_lowercase(),
                    None => false,
                }
            } else {
                false
            };

            if starts_word && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }

        out.push(c.to_ascii_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Terraform attribute name for a JSON field name
pub fn terraform_name(json_name: &str) -> String {
    let name = to_snake_case(json_name);
    match name.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", name),
        Some(_) => name,
    }
}

/// Pick `base`, or `base_2`, `base_3`, ... when the name is already taken
pub fn unique_name(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Terraform type name of a resource: `<prefix>_<group>_<kind>_<version>`
///
/// The group is omitted for the core API group.
pub fn resource_type_name(prefix: &str, group: &str, kind: &str, version: &str) -> String {
    let mut parts = vec![prefix.to_string()];
    if !group.is_empty() {
        parts.push(to_snake_case(group));
    }
    parts.push(to_snake_case(kind));
    parts.push(to_snake_case(version));
    parts.join("_")
}
