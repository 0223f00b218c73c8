use std::fmt::Display;

pub fn print_table<N: Display>(rows: &[(String, Vec<N>)], columns: &[&str]) {
    let cell_w = 15;
    let divider = "-".repeat(columns.len() * (cell_w + 2) + 1);

    println!("{divider}");
    let mut header = String::from("| ");
    for c in columns {
        header.push_str(&format!("{c:<cell_w$}| "));
    }
    println!("{header}");
    println!("{divider}");

    for (name, cells) in rows {
        let mut row = format!("| {name:<cell_w$}| ");
        for cell in cells {
            row.push_str(&format!("{:<cell_w$.2}| ", cell));
        }
        println!("{row}");
    }

    println!("{divider}");
}

#[allow(dead_code)]
fn main() {}
