// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
  ___ _ __ _____      __   ___| |_| |
 / __| '__/ _ \ \ /\ / /  / __| __| |
| (__| | |  __/\ V  V /  | (__| |_| |
 \___|_|  \___| \_/\_/    \___|\__|_|

    Project Generation Client
"#;
    println!("{}", banner);
}
