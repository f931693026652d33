// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! Minimal dispatching service: a producer thread posts messages, the
//! process echoes them into the rotating file log and a timer stops the
//! whole thing after one second.
//!
//! ```sh
//! cargo run --example echo -- config=echo.ini
//! ```

use dispatch_rs::{Kind, LogConfig, LogService, Process};

use tracing::info;
use tracing_subscriber::EnvFilter;

use std::sync::Arc;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let log = Arc::new(LogService::new(LogConfig {
        prefix: "echo".to_owned(),
        dir: "logs".into(),
        ..LogConfig::default()
    }));
    log.start();

    let process = Process::new("echo");
    let args: Vec<String> = std::env::args().skip(1).collect();
    process.initialize(&args);

    let sink = log.clone();
    process.register_message_handler("echo", move |message| {
        sink.log(
            Kind::Info,
            &format!("received {} bytes", message.payload.len()),
        );
        Ok(())
    });

    let stopper = process.clone();
    process.register_timer(1, move |_| {
        info!("Deadline reached, stopping.");
        stopper.stop();
        Ok(())
    });

    let producer = process.clone();
    std::thread::spawn(move || {
        for i in 0..5 {
            producer.post_message("echo", format!("hello {}", i));
            std::thread::sleep(Duration::from_millis(100));
        }
    });

    process.start_timer(1, Duration::from_secs(1));
    process.start();
    log.stop();
}
