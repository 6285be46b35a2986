// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::{Client, CustomResourceExt};
use swift_storage_controller::config::ControllerConfig;
use swift_storage_controller::controller::run_controller;
use swift_storage_controller::swiftstorage_types::SwiftStorage;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "swift-storage-controller", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the SwiftStorage custom resource definition as YAML.
    Export,
    /// Run the controller against the current kubeconfig context.
    Run(ControllerConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Export => {
            info!("exporting custom resource definition");
            println!("{}", serde_yaml::to_string(&SwiftStorage::crd())?);
        }
        Command::Run(config) => {
            info!("running swift-storage-controller");
            let client = Client::try_default().await?;
            run_controller(client, config).await;
            info!("controller terminated");
        }
    }
    Ok(())
}
