use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Passive domain reconnaissance: DNS, WHOIS and CT log subdomains", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HttpArgs {
    /// CT aggregator request timeout in seconds (default: 10)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Attempts per CT query (default: 3, max: 10)
    #[arg(short = 'r', long)]
    pub retries: Option<u32>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Full scan: DNS records, WHOIS and CT log subdomains
    Scan {
        /// Target domain (e.g. example.com or https://www.example.com/)
        target: String,

        #[command(flatten)]
        http: HttpArgs,

        /// Print the result as JSON instead of the text summary
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Save the result to a file (.json for JSON, anything else for text)
        #[arg(short = 'o', long, value_name = "FILE")]
        out: Option<String>,

        /// Skip DNS record retrieval
        #[arg(long, default_value_t = false)]
        no_dns: bool,

        /// Skip WHOIS lookup
        #[arg(long, default_value_t = false)]
        no_whois: bool,

        /// Skip CT log subdomain discovery
        #[arg(long, default_value_t = false)]
        no_subdomains: bool,
    },

    /// CT log subdomain discovery only
    Subdomains {
        /// Target domain
        target: String,

        #[command(flatten)]
        http: HttpArgs,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::parse_from([
            "netscout", "scan", "example.com", "--timeout", "5", "-r", "2", "--json", "--no-whois", "--debug",
        ]);
        assert!(cli.debug);
        match cli.command {
            Commands::Scan { target, http, json, no_whois, no_dns, .. } => {
                assert_eq!(target, "example.com");
                assert_eq!(http.timeout, Some(5));
                assert_eq!(http.retries, Some(2));
                assert!(json);
                assert!(no_whois);
                assert!(!no_dns);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_subdomains() {
        let cli = Cli::parse_from(["netscout", "subdomains", "example.com"]);
        assert!(matches!(cli.command, Commands::Subdomains { .. }));
    }
}
