/// Strip a surrounding markdown code fence, if present. Models keep
/// wrapping code in ``` blocks even when asked not to.
pub fn sanitize_code(code: &str) -> String {
    let code = code.trim();
    if !code.starts_with("```") {
        return code.to_string();
    }

    let lines: Vec<&str> = code.lines().collect();
    let body: &[&str] = if lines.len() > 1 {
        if lines.last().is_some_and(|l| l.trim() == "```") {
            &lines[1..lines.len() - 1]
        } else {
            &lines[1..]
        }
    } else {
        &[]
    };

    body.join("\n").trim().to_string()
}

/// Best-effort language detection from telltale code patterns, used
/// when the caller asked for `auto`. First match wins.
pub fn detect_language(code: &str) -> &'static str {
    let code = code.to_lowercase();

    let patterns: [(&str, &[&str]); 10] = [
        ("python", &["def ", "import ", "print(", "class ", "__init__"]),
        ("javascript", &["const ", "let ", "function ", "=>", "console.log"]),
        ("typescript", &[": string", ": number", "interface ", "type "]),
        ("java", &["public class", "public static", "void main", "system.out"]),
        ("cpp", &["#include", "std::", "cout", "int main"]),
        ("c", &["#include", "printf", "int main", "void "]),
        ("go", &["package main", "func main", "fmt.print"]),
        ("rust", &["fn main", "let mut", "println!"]),
        ("php", &["<?php", "function ", "$"]),
        ("ruby", &["def ", "end", "puts "]),
    ];

    for (language, keywords) in patterns {
        if keywords.iter().any(|keyword| code.contains(keyword)) {
            return language;
        }
    }

    "text"
}
