const SENSITIVE_MARKERS: [&str; 5] = ["KEY", "SECRET", "TOKEN", "PASSWORD", "CREDENTIAL"];

fn sanitize_value(key: &str, value: &str) -> String {
    let upper = key.to_ascii_uppercase();
    if SENSITIVE_MARKERS.iter().any(|marker| upper.contains(marker)) {
        format!("your_{}_here", key.to_ascii_lowercase())
    } else {
        value.to_string()
    }
}

/// Rewrites `.env` contents for publishing as `.env.example`: secret values
/// become placeholders, everything else is kept line for line.
pub fn sanitize_env_example(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for line in input.lines() {
        let line = line.trim();
        match line.split_once('=') {
            Some((key, value)) if !line.starts_with('#') => {
                output.push_str(key);
                output.push('=');
                output.push_str(&sanitize_value(key, value));
            }
            _ => output.push_str(line),
        }
        output.push('\n');
    }
    output
}
