use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use modc_core::{BuildOptions, Builder, ReverseOptions, Reverser};

#[derive(Parser, Debug)]
#[command(
    name = "modc",
    about = "Reverse save documents into editable mod trees and build them back",
    version
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Split a save JSON into config.json plus per-object script folders
    Reverse(ReverseArgs),
    /// Recompose a save JSON from a reversed mod tree
    Build(BuildArgs),
    /// Check that every asset in a mod tree is referenced exactly once
    Audit(AuditArgs),
}

#[derive(ClapArgs, Debug)]
struct ReverseArgs {
    /// Save file to reverse (.json)
    path: PathBuf,
    /// Output directory; must be empty or missing unless --backup is given
    #[arg(long, value_name = "DIR")]
    out: PathBuf,
    /// Zip and replace a non-empty output directory
    #[arg(long, default_value_t = false)]
    backup: bool,
    /// Keep empty script fields in config.json instead of dropping them
    #[arg(long, default_value_t = false)]
    keep_empty: bool,
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// Mod tree produced by `reverse`
    root: PathBuf,
    /// Extra directories searched for scripts after the mod tree, in order
    #[arg(long = "read-root", value_name = "DIR")]
    read_roots: Vec<PathBuf>,
    /// Write the save here instead of <root>/output.json
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct AuditArgs {
    /// Mod tree produced by `reverse`
    root: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    match cli.cmd {
        Cmd::Reverse(a) => cmd_reverse(a),
        Cmd::Build(a) => cmd_build(a),
        Cmd::Audit(a) => cmd_audit(a),
    }
}

fn cmd_reverse(args: ReverseArgs) {
    let doc = modc_core::read_json_file(&args.path).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    let fresh = modc_core::is_fresh_root(&args.out).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    if !fresh {
        if !args.backup {
            eprintln!(
                "error: {} is not empty; pass --backup to archive and replace it",
                args.out.display()
            );
            std::process::exit(3);
        }
        modc_core::replace_with_backup(&args.out).unwrap_or_else(|e| {
            eprintln!("backup error: {}", e);
            std::process::exit(4);
        });
    }
    let opts = ReverseOptions {
        keep_empty: args.keep_empty,
    };
    if let Err(e) = Reverser::new(&args.out, opts).reverse_to_root(&doc) {
        eprintln!("error: {}", e);
        std::process::exit(5);
    }
}

fn cmd_build(args: BuildArgs) {
    let opts = BuildOptions {
        extra_read_roots: args.read_roots,
    };
    let builder = Builder::new(&args.root, opts);
    let res = match &args.out {
        Some(out) => builder.build_from_root().and_then(|doc| {
            modc_core::write_json_file(out, &doc)?;
            log::info!("built save into {}", out.display());
            Ok(())
        }),
        None => builder.build_to_root().map(|_| ()),
    };
    if let Err(e) = res {
        eprintln!("error: {}", e);
        std::process::exit(5);
    }
}

fn cmd_audit(args: AuditArgs) {
    let report = modc_core::audit_root(&args.root).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    for p in &report.orphaned {
        println!("orphaned\t{}", p.display());
    }
    for p in &report.dangling {
        println!("dangling\t{}", p.display());
    }
    for p in &report.shared {
        println!("shared\t{}", p.display());
    }
    println!("{} references checked", report.referenced);
    if !report.is_clean() {
        std::process::exit(6);
    }
}
