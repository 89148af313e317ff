//! clawdash: cost, token and subscription-utilization dashboard for
//! OpenClaw agent transcripts.

pub mod cli;
pub mod parsers;
pub mod services;
pub mod types;
