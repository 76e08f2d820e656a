use netkat_core::headers::ALL_HEADERS;
use netkat_core::HEADER_TABLE_VERSION;

use crate::OutputFormat;

pub(crate) fn cmd_headers(output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = ALL_HEADERS
                .iter()
                .map(|h| {
                    serde_json::json!({
                        "header": h.as_str(),
                        "wire":   h.wire_header().as_str(),
                        "vendor": h.vendor_name(),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "version": HEADER_TABLE_VERSION,
                "headers": rows,
            });
            let pretty = serde_json::to_string_pretty(&doc)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            println!("header table version {}", HEADER_TABLE_VERSION);
            println!("{:<10} {:<12} {}", "header", "wire", "vendor");
            for h in ALL_HEADERS {
                println!(
                    "{:<10} {:<12} {}",
                    h.as_str(),
                    h.wire_header().as_str(),
                    h.vendor_name().unwrap_or("-")
                );
            }
        }
    }
}
