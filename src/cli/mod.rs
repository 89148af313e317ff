use crate::parsers::OpenClawParser;
use crate::services::config_loader;
use crate::services::{
    ConfigSource, DateFilter, OpenClawCli, PricingCatalog, SnapshotService,
};
use crate::types::{DashboardConfig, LiveSession, LiveSessions, Snapshot};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Cost, token and subscription-utilization dashboard for OpenClaw agents
#[derive(Parser)]
#[command(name = "clawdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Agents directory holding `<agent>/sessions/*.jsonl` (default: ~/.openclaw/agents)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// OpenClaw config file (default: ~/.openclaw/openclaw.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Replacement pricing catalog (JSON)
    #[arg(long, global = true)]
    pricing: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cumulative cost and usage (default)
    Summary {
        /// First day to include (YYYY-MM-DD, UTC)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD, UTC)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List live agent sessions
    Sessions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh periodically and print a status line until Ctrl-C
    Watch {
        /// Refresh interval in milliseconds (default: refreshIntervalMs from config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            None => self.summary(None, None, false).await,
            Some(Commands::Summary { from, to, json }) => self.summary(from, to, json).await,
            Some(Commands::Sessions { json }) => self.sessions(json).await,
            Some(Commands::Watch { interval_ms }) => self.watch(interval_ms).await,
        }
    }

    async fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        json: bool,
    ) -> anyhow::Result<()> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }
        }

        let service = self.service()?;
        let snapshot = service.collect(DateFilter::new(from, to)).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        } else {
            println!("{}", format_summary(&snapshot));
        }
        Ok(())
    }

    async fn sessions(&self, json: bool) -> anyhow::Result<()> {
        let pricing = self.pricing()?;
        let live = LiveSessions::fetch(&OpenClawCli::new(), &pricing)
            .await
            .context("listing live sessions")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&live)?);
        } else {
            println!("{}", format_sessions(&live));
        }
        Ok(())
    }

    async fn watch(&self, interval_ms: Option<u64>) -> anyhow::Result<()> {
        let service = self.service()?;
        let interval = interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| service.refresh_interval());

        service.start(interval).await;

        let mut ticker = tokio::time::interval(interval);
        let mut last_printed = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(snapshot) = service.cached().await {
                        if last_printed != Some(snapshot.captured_at) {
                            last_printed = Some(snapshot.captured_at);
                            println!("{}", format_status(&snapshot));
                        }
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    result.context("waiting for Ctrl-C")?;
                    break;
                }
            }
        }

        service.stop().await;
        Ok(())
    }

    fn pricing(&self) -> anyhow::Result<PricingCatalog> {
        match &self.pricing {
            Some(path) => PricingCatalog::load(path)
                .with_context(|| format!("loading pricing catalog {}", path.display())),
            None => Ok(PricingCatalog::builtin()),
        }
    }

    fn config_source(&self) -> ConfigSource {
        match self.config.clone().or_else(config_loader::default_config_path) {
            Some(path) => ConfigSource::File(path),
            None => ConfigSource::Fixed(DashboardConfig::default()),
        }
    }

    fn parser(&self) -> OpenClawParser {
        match &self.data_dir {
            Some(dir) => OpenClawParser::with_data_dir(dir.clone()),
            None => OpenClawParser::new(),
        }
    }

    fn service(&self) -> anyhow::Result<SnapshotService> {
        Ok(SnapshotService::new(
            Arc::new(self.parser()),
            Arc::new(OpenClawCli::new()),
            self.pricing()?,
            self.config_source(),
        ))
    }
}

/// Compact token count: 950, 12.3K, 4.56M
pub fn fmt_tokens(n: u64) -> String {
    if n < 1_000 {
        n.to_string()
    } else if n < 1_000_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        format!("{:.2}M", n as f64 / 1e6)
    }
}

/// Multi-line text summary of a snapshot
pub fn format_summary(snapshot: &Snapshot) -> String {
    let c = &snapshot.cumulative;
    let mut out = String::new();

    let _ = writeln!(out, "OpenClaw Dashboard");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Cost: ${:.2} total | ${:.2}/day | ${:.2}/mo est.",
        c.total_cost, c.daily_cost, c.monthly_cost
    );
    let _ = writeln!(
        out,
        "Tokens: {} (in: {} / out: {})",
        fmt_tokens(c.total_tokens),
        fmt_tokens(c.total_input),
        fmt_tokens(c.total_output)
    );
    let _ = writeln!(out, "Active: {} days ({} total)", c.active_days, c.days_running);
    let _ = writeln!(
        out,
        "Subscription: ${:.2} -> ${:.2} API value ({}% util)",
        c.subscription_total, c.total_estimated_api_cost, c.utilization
    );
    if !c.unconfigured_providers.is_empty() {
        let _ = writeln!(
            out,
            "Unconfigured providers: {} (add a subscription to track usage)",
            c.unconfigured_providers.join(", ")
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Agents:");

    let main_key = snapshot.sessions.main.as_ref().map(|s| s.key.as_str());
    for (name, agent) in &c.by_agent {
        let live = name == "main" || main_key.is_some_and(|k| k.contains(name.as_str()));
        let _ = writeln!(
            out,
            "  {} {}: ${:.2} | {} tokens",
            if live { "*" } else { "-" },
            name,
            agent.cost,
            fmt_tokens(agent.tokens)
        );
    }

    let _ = writeln!(out);
    let s = &snapshot.stats;
    let _ = write!(
        out,
        "Sessions: {} total | {} subagents ({} active) | {} cron",
        s.total, s.subagents, s.active_subagents, s.cron
    );
    if let Some(error) = &snapshot.error {
        let _ = write!(out, "\n({})", error);
    }
    if c.skipped.total() > 0 {
        let _ = write!(out, "\nSkipped records: {}", c.skipped.total());
    }
    out
}

fn session_line(out: &mut String, session: &LiveSession) {
    let _ = writeln!(
        out,
        "  [{:?}] {} {} | {} tokens | ${:.2}",
        session.status,
        session.id,
        session.model,
        fmt_tokens(session.tokens),
        session.cost
    );
}

/// Live sessions grouped as main, subagents, cron
pub fn format_sessions(live: &LiveSessions) -> String {
    let mut out = String::new();
    if let Some(main) = &live.sessions.main {
        let _ = writeln!(out, "Main:");
        session_line(&mut out, main);
    }
    let _ = writeln!(
        out,
        "Subagents: {} ({} active)",
        live.stats.subagents, live.stats.active_subagents
    );
    for session in &live.sessions.subagents {
        session_line(&mut out, session);
    }
    let _ = writeln!(out, "Cron: {}", live.stats.cron);
    for session in &live.sessions.cron {
        session_line(&mut out, session);
    }
    let _ = write!(out, "Total: {}", live.stats.total);
    out
}

/// One-line status for `watch`
pub fn format_status(snapshot: &Snapshot) -> String {
    let c = &snapshot.cumulative;
    format!(
        "{} ${:.2} total | ${:.2}/day | {} tokens | {} sessions ({} active subagents)",
        snapshot.captured_at.format("%H:%M:%S"),
        c.total_cost,
        c.daily_cost,
        fmt_tokens(c.total_tokens),
        snapshot.stats.total,
        snapshot.stats.active_subagents
    )
}
