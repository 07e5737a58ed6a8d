//! BootCrab
//!
//! Command line front end for the runtime support library. Useful to check
//! executable path discovery on a host and to exercise init blocks by hand.

use anyhow::{Context, Result, anyhow};
use bootcrab::node::{ConstantNode, WriteSlotNode};
use bootcrab::{
    ExpressionNode, Frame, FrameDescriptor, FrameLayout, InitBlock, STACK_POINTER_SLOT, Value,
};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(version, about = "Runtime support diagnostics")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the canonical path of this executable.
    ExePath,
    /// Run an init block that stores each slot value, then print the frame.
    RunInits {
        /// Value installed in the stack pointer slot.
        #[arg(long, value_parser = parse_u64)]
        stack_pointer: u64,
        /// Slot to initialize, as NAME=VALUE.
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<(String, u64)>,
    },
}

fn main() -> ExitCode {
    let log_level = std::env::var("BOOTCRAB_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::ExePath => print_exe_path(),
        Command::RunInits {
            stack_pointer,
            slots,
        } => run_inits(stack_pointer, slots),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_exe_path() -> Result<()> {
    match bootcrab::executable_path()? {
        Some(path) => println!("{}", path.display()),
        None => println!("<unknown>"),
    }
    Ok(())
}

fn run_inits(stack_pointer: u64, slots: Vec<(String, u64)>) -> Result<()> {
    let names = std::iter::once(STACK_POINTER_SLOT.to_string())
        .chain(slots.iter().map(|(name, _)| name.clone()));
    let descriptor = Arc::new(FrameDescriptor::new(names)?);

    let mut nodes: Vec<Box<dyn ExpressionNode>> = Vec::with_capacity(slots.len());
    for (name, value) in &slots {
        let slot = descriptor
            .find_slot(name)
            .ok_or_else(|| anyhow!("Slot `{}` not found", name))?;
        nodes.push(Box::new(WriteSlotNode::new(
            slot,
            ConstantNode::new(Value::from_type(*value)),
        )));
    }
    let block = InitBlock::new(nodes, descriptor.clone())?;
    info!("Running {}", block);

    let mut frame = Frame::new(descriptor.as_ref(), vec![Value::from_type(stack_pointer)]);
    block.run(&mut frame)?;

    for (slot, value) in frame.written_slots() {
        let name = descriptor.slot_name(slot).unwrap_or("?");
        println!("{name} = {value}");
    }
    Ok(())
}

fn parse_u64(arg: &str) -> Result<u64> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.with_context(|| format!("invalid integer `{arg}`"))
}

fn parse_slot(arg: &str) -> Result<(String, u64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, found `{arg}`"))?;
    if name.is_empty() {
        return Err(anyhow!("empty slot name in `{arg}`"));
    }
    Ok((name.to_string(), parse_u64(value)?))
}
