use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands, HttpArgs};
use netscout::{Domain, ScanConfig, ScanOptions, Scanner, SubdomainFinder};

fn print_banner() {
    println!(r#"
     _   _      _   ____                  _
    | \ | | ___| |_/ ___|  ___ ___  _   _| |_
    |  \| |/ _ \ __\___ \ / __/ _ \| | | | __|
    | |\  |  __/ |_ ___) | (_| (_) | |_| | |_
    |_| \_|\___|\__|____/ \___\___/ \__,_|\__|

              Passive Domain Recon v0.1.0
    "#);
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep external crates (reqwest/hyper/hickory) at INFO to avoid flooding the CLI.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "netscout={crate},reqwest=info,hyper=info,h2=info,hickory_resolver=warn,hickory_proto=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing with partial results");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Scan { target, http, json, out, no_dns, no_whois, no_subdomains } => {
            let config = build_config(&http);
            tracing::debug!(?config, "Resolved configuration");
            let options = ScanOptions {
                dns: !no_dns,
                whois: !no_whois,
                subdomains: !no_subdomains,
            };

            if !json {
                print_banner();
                println!("[>] Target: {}", target);
                println!("[~] CT timeout: {}s, attempts: {}", config.http_timeout.as_secs(), config.http_retries);
                println!("\n{}\n", "-".repeat(60));
            }

            let scanner = Scanner::new(&config);
            let result = scanner.scan_domain(&target, options, &cancel).await?;

            if json {
                println!("{}", netscout::output::to_json(&result)?);
            } else {
                print!("{}", netscout::output::render_text(&result));
            }

            if let Some(path) = out {
                netscout::output::save_to_file(&result, Path::new(&path))?;
                if !json {
                    println!("\n[=] Results saved to: {}", path);
                }
            }
        }
        Commands::Subdomains { target, http } => {
            let config = build_config(&http);
            let domain = Domain::parse(&target)?;

            println!("[*] Subdomain enumeration for {}...", domain);
            let finder = SubdomainFinder::new(&config);
            let subdomains = finder.discover(&domain, &cancel).await;
            print!("{}", SubdomainFinder::generate_report(&domain, &subdomains));
        }
    }
    Ok(())
}

/// Defaults, then `NETSCOUT_*` environment, then CLI flags.
fn build_config(http: &HttpArgs) -> ScanConfig {
    let mut config = ScanConfig::from_env();
    if let Some(secs) = http.timeout {
        config = config.timeout_secs(secs);
    }
    if let Some(retries) = http.retries {
        config = config.retries(retries);
    }
    config
}
