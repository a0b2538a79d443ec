use anyhow::{anyhow, bail, Context, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use healthwatch::config::{Config, ProbeConfig, WatcherPolicy};
use healthwatch::http::HttpProbeOptions;
use healthwatch::tcp::TcpProbeOptions;
use healthwatch::Watcher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn command() -> Command {
    Command::new("hc")
        .about("Wait until a dependency becomes healthy")
        .arg(
            arg!(--config <file> "Read probe and watcher settings from a YAML file")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf))
        )
        .arg(
            arg!(--protocol <protocol> "The protocol to use for the healthcheck")
                .required_unless_present("config")
                .conflicts_with("config")
                .value_parser(["tcp", "http"])
        )
        .arg(
            arg!(--host <host> "The host to check")
                .conflicts_with("config")
                .required(false)
                .default_value("localhost")
        )
        .arg(
            arg!(--port <port> "The port to check")
                .conflicts_with("config")
                .required_if_eq("protocol", "tcp")
                .value_parser(clap::value_parser!(u16))
        )
        .arg(
            arg!(--url <url> "The url to check")
                .conflicts_with("config")
                .required_if_eq("protocol", "http")
        )
        .arg(
            arg!(--method <method> "The http method")
                .conflicts_with("config")
                .required(false)
                .default_value("HEAD")
        )
        .arg(
            arg!(--"expected-status" <status> "The expected http status code")
                .conflicts_with("config")
                .required(false)
                .default_value("200")
                .value_parser(clap::value_parser!(u16))
        )
        .arg(
            arg!(--header <header> "An extra request header as key:value, may be repeated")
                .conflicts_with("config")
                .required(false)
                .action(ArgAction::Append)
        )
        .arg(
            arg!(--user <user> "The username for basic auth")
                .conflicts_with("config")
                .required(false)
        )
        .arg(
            arg!(--password <password> "The password for basic auth")
                .conflicts_with("config")
                .required(false)
                .requires("user")
        )
        .arg(
            arg!(--timeout <timeout> "The timeout of a single check")
                .conflicts_with("config")
                .required(false)
                .default_value("30s")
                .value_parser(humantime::parse_duration)
        )
        .arg(
            arg!(--interval <interval> "The interval between checks")
                .conflicts_with("config")
                .required(false)
                .default_value("1s")
                .value_parser(humantime::parse_duration)
        )
        .arg(
            arg!(--retries <max_retries> "The max failed checks before giving up")
                .conflicts_with("config")
                .required(false)
                .default_value("120")
                .value_parser(clap::value_parser!(usize))
        )
}

fn parse_header(header: &str) -> Result<(String, String)> {
    let (key, value) = header
        .split_once(':')
        .ok_or_else(|| anyhow!("header {:?} is not in key:value form", header))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        return Config::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    let host = matches.get_one::<String>("host").context("missing --host")?;
    let timeout = *matches.get_one::<Duration>("timeout").context("missing --timeout")?;

    let probe = match matches.get_one::<String>("protocol").map(String::as_str) {
        Some("tcp") => {
            let port = *matches.get_one::<u16>("port").context("missing --port")?;
            ProbeConfig::Tcp(
                TcpProbeOptions::new(port)
                    .with_hostname(host)
                    .with_timeout(timeout),
            )
        }
        Some("http") => {
            let url = matches.get_one::<String>("url").context("missing --url")?;
            let method = matches.get_one::<String>("method").context("missing --method")?;
            let status = *matches
                .get_one::<u16>("expected-status")
                .context("missing --expected-status")?;

            let mut options = HttpProbeOptions::new(url)
                .with_method(method)
                .with_expected_status(status)
                .with_timeout(timeout);

            for header in matches.get_many::<String>("header").into_iter().flatten() {
                let (key, value) = parse_header(header)?;
                options = options.with_header(key, value);
            }

            if let Some(user) = matches.get_one::<String>("user") {
                let password = matches
                    .get_one::<String>("password")
                    .map(String::as_str)
                    .unwrap_or("");
                options = options.with_basic_auth(user.as_str(), password);
            }

            ProbeConfig::Http(options)
        }
        other => bail!("unknown protocol: {:?}", other),
    };

    let watcher = WatcherPolicy {
        recheck_interval: *matches.get_one::<Duration>("interval").context("missing --interval")?,
        recheck_limit: *matches.get_one::<usize>("retries").context("missing --retries")?,
    };

    Ok(Config { watcher, probe })
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let target = config.probe.target();

    let listener_target = target.clone();
    let watcher = Watcher::from_policy(&config.watcher).with_result_listener(move |counter, err| {
        warn!("{} \t ❌\t check {} failed: {}", listener_target, counter, err);
    });
    let probe = config.probe.into_probe();

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    info!(
        "waiting for {} (every {:?}, at most {} failed checks)",
        target,
        watcher.recheck_interval(),
        watcher.recheck_limit()
    );

    watcher
        .wait_until_healthy_or_cancelled(&probe, &token)
        .await
        .with_context(|| format!("{} did not become healthy", target))?;

    info!("{} \t ✅", target);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(command().get_matches()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
