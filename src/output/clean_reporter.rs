use std::fs;
use std::path::Path;

use crate::error::ScanError;
use crate::scan::ScanResult;

/// Plain-text summary of a finished scan.
pub fn render_text(result: &ScanResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push_str(&format!("\n{}\n              SCAN COMPLETE\n{}\n", rule, rule));
    out.push_str("\n[*] Summary:\n");
    out.push_str(&format!("   Target: {}\n", result.target_domain));
    out.push_str(&format!("   Subdomains: {}\n", result.summary.total_subdomains));
    out.push_str(&format!("   IP addresses: {}\n", result.summary.total_ip_addresses));

    let dns = &result.dns_info;
    out.push_str("\n[DNS] Records:\n");
    push_list(&mut out, "A", &dns.a_records);
    push_list(&mut out, "AAAA", &dns.aaaa_records);
    let mx: Vec<String> = dns
        .mx_records
        .iter()
        .map(|mx| format!("{} {}", mx.priority, mx.host))
        .collect();
    push_list(&mut out, "MX", &mx);
    push_list(&mut out, "NS", &dns.ns_records);
    push_list(&mut out, "TXT", &dns.txt_records);
    push_list(&mut out, "CNAME", &dns.cname_records);
    if dns.is_empty() {
        out.push_str("   [-] No records\n");
    }

    let whois = &result.whois_info;
    out.push_str("\n[WHOIS] Registration:\n");
    if let Some(ref err) = whois.error {
        out.push_str(&format!("   [!] Unavailable: {}\n", err));
    } else {
        out.push_str(&format!("   Registrar: {}\n", whois.registrar.as_deref().unwrap_or("-")));
        out.push_str(&format!("   Created: {}\n", whois.creation_date.as_deref().unwrap_or("-")));
        out.push_str(&format!("   Expires: {}\n", whois.expiration_date.as_deref().unwrap_or("-")));
        out.push_str(&format!("   Status: {}\n", whois.status.as_deref().unwrap_or("-")));
        push_list(&mut out, "Name servers", &whois.name_servers);
        push_list(&mut out, "Emails", &whois.emails);
    }

    out.push_str(&format!("\n[CT] Subdomains ({}):\n", result.subdomains.len()));
    if result.subdomains.is_empty() {
        out.push_str("   [-] None found\n");
    }
    for sub in &result.subdomains {
        out.push_str(&format!("   - {}\n", sub));
    }

    out
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        out.push_str(&format!("   {}: {}\n", label, items.join(", ")));
    }
}

pub fn to_json(result: &ScanResult) -> Result<String, ScanError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Save the result, as JSON for `.json` paths and as text otherwise.
pub fn save_to_file(result: &ScanResult, path: &Path) -> Result<(), ScanError> {
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("txt");

    let contents = match extension {
        "json" => to_json(result)?,
        _ => render_text(result),
    };
    fs::write(path, contents)?;
    Ok(())
}
