// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `deepwork hook <name>` - generic loader for a named hook module.
//!
//! Hook modules are resolved under a fixed namespace so callers can pass
//! either a short name (`stop`) or a fully qualified one
//! (`deepwork_cli::hooks::stop`). Concrete hook modules live outside this
//! crate's core responsibility; only `noop` ships here to exercise the
//! loader itself.

use anyhow::Result;
use clap::Args;

const HOOK_NAMESPACE: &str = "deepwork_cli::hooks";

#[derive(Args)]
pub struct HookArgs {
    /// Short or fully qualified hook module name
    pub name: String,
}

/// A loadable hook module: a `main` entry point taking the hook's stdin
/// payload and raw CLI args, returning a process exit code.
trait HookModule {
    fn main(&self, payload: &str, args: &[String]) -> i32;
}

/// Does nothing; always reports success. Used to smoke-test the loader.
struct NoopHook;

impl HookModule for NoopHook {
    fn main(&self, _payload: &str, _args: &[String]) -> i32 {
        0
    }
}

fn resolve(name: &str) -> Option<Box<dyn HookModule>> {
    let short = name
        .strip_prefix(HOOK_NAMESPACE)
        .map(|rest| rest.trim_start_matches("::"))
        .unwrap_or(name);
    match short {
        "noop" => Some(Box::new(NoopHook)),
        _ => None,
    }
}

pub fn hook(args: HookArgs) -> Result<i32> {
    let Some(module) = resolve(&args.name) else {
        eprintln!(
            "no hook module named '{}' under namespace '{}'",
            args.name, HOOK_NAMESPACE
        );
        return Ok(1);
    };

    let mut payload = String::new();
    use std::io::Read;
    std::io::stdin().read_to_string(&mut payload).ok();

    let argv: Vec<String> = std::env::args().skip(3).collect();
    Ok(module.main(&payload, &argv))
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
