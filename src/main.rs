use std::process::ExitCode;

use tracing::{error, info};

use privddns::config::Config;
use privddns::http::UreqTransport;
use privddns::ip::HttpIpSource;
use privddns::persistence::LastIpStore;
use privddns::pipeline::Pipeline;
use privddns::poller::Poller;
use privddns::services::porkbun::{Client, TxtRecord};
use privddns::services::{dummy, TxtPublisher};

fn main() -> ExitCode {
    privddns::init_logging();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}; exiting.", e);
            return ExitCode::FAILURE;
        }
    };

    let transport = UreqTransport::new(config.http_timeout);

    let publisher: Box<dyn TxtPublisher> = if config.dry_run {
        info!("Dry run: the TXT record will not actually be updated");
        Box::new(dummy::Service::new(&config.domain, &config.subdomain))
    } else {
        let client = Client::new(transport.clone()).with_defaults(config.default_credentials.clone());
        Box::new(TxtRecord::new(client, &config.domain, &config.subdomain, config.ttl))
    };

    info!(
        "privddns v{} started, publishing to TXT {}.{} every {} second(s)",
        env!("CARGO_PKG_VERSION"),
        config.subdomain,
        config.domain,
        config.check_interval.map(u32::from).unwrap_or(0)
    );

    let mut poller = Poller::new(
        HttpIpSource::new(config.ip_source.clone(), transport),
        LastIpStore::new(&config.last_ip_file),
        Pipeline::new(&config.key_file, publisher),
        config.check_interval,
    );

    poller.run();

    ExitCode::SUCCESS
}
