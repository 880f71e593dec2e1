// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::IsTerminal;

use plinth::{CategoryCatalog, CategoryType};

/// One printable catalog row.
#[derive(Debug, PartialEq)]
pub struct CatalogRow {
    pub category: CategoryType,
    pub config_key: &'static str,
    pub open: bool,
    pub description: String,
}

pub fn catalog_rows(catalog: &CategoryCatalog) -> Vec<CatalogRow> {
    CategoryType::ALL
        .into_iter()
        .map(|category| match catalog.handler(category) {
            Some(handler) => CatalogRow {
                category,
                config_key: category.config_key(),
                open: handler.accepts_plugins(),
                description: handler.description().to_string(),
            },
            None => CatalogRow {
                category,
                config_key: category.config_key(),
                open: false,
                description: "not supported by this catalog".to_string(),
            },
        })
        .collect()
}

pub fn print_catalog(catalog: &CategoryCatalog, plain: bool) {
    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  plinth catalog");
    println!("  {}", "-".repeat(60));

    for row in catalog_rows(catalog) {
        let name = format!("{:<10}", row.category.to_string());
        let key = format!("[{}]", row.config_key);
        let line = if use_color {
            use colored::Colorize;
            let mark = if row.open { "✓".green() } else { "✗".red() };
            format!("    {mark} {name} {:<12} {}", key.cyan(), row.description)
        } else {
            let mark = if row.open { "[OPEN]  " } else { "[CLOSED]" };
            format!("    {mark} {name} {key:<12} {}", row.description)
        };
        println!("{line}");
    }
    println!();
}
