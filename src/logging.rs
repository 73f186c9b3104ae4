//! Pretty-printing messages to the console

use colored::Colorize;

/// Print a numbered diagnostic to standard output.
///
/// `location` carries the line number and the extension of the file being
/// scanned (`"as"` or `"am"`); internal diagnostics pass `None`.
pub fn diagnostic(number: i32, location: Option<(usize, &str)>, message: &str) {
    let tag = format!("Error [{number}]").red().bold();
    match location {
        Some((line, extension)) => {
            println!("{tag} at line {line} in the .{extension} file: {message}");
        }
        None => println!("{tag}: {message}"),
    }
}

/// Print the per-file success notice to standard output.
pub fn success(stem: &str) {
    println!("{} {}", "Program succeeded for file:".green(), stem);
}
