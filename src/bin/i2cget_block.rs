//! CLI tool for reading a block of bytes from an I2C/SMBus device.
//!
//! This tool uses the `i2cget_block` library to read a register block
//! through `/dev/i2c-N` and prints it as a single hex string.

use clap::{ArgAction, Parser};
use i2cget_block::error::EXIT_SETUP;
use i2cget_block::{
    lookup_bus, parse_address, parse_register, BlockReader, LinuxOpener, Options, State,
    MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::process;

const USAGE: &str = "i2cget_block [-f] [-V] I2CBUS CHIP-ADDRESS [DATA-ADDRESS [SIZE[p]]]";

/// Read a block of bytes from an I2C/SMBus device register.
#[derive(Parser, Debug)]
#[command(name = "i2cget_block")]
#[command(about, long_about = None, override_usage = USAGE)]
#[command(disable_version_flag = true, disable_help_flag = true)]
struct Args {
    /// Bind even if the address is already claimed by a driver
    #[arg(short, long)]
    force: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// I2C bus number or adapter name
    bus: String,

    /// Chip address (0x03 - 0x77)
    address: String,

    /// Register to read from (0x00 - 0xff)
    register: Option<String>,

    /// Number of bytes to read (1 - 32), append `p` to enable PEC
    size: Option<String>,
}

fn main() {
    let mut argv = env::args_os();
    let program = argv.next().unwrap_or_else(|| OsString::from("i2cget_block"));
    let (flags, positionals) = split_leading_flags(argv.collect());

    if requests_version(&flags) {
        eprintln!("i2cget_block version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    // Flags are only recognized before the first positional argument.
    let cmdline = std::iter::once(program)
        .chain(flags)
        .chain(std::iter::once(OsString::from("--")))
        .chain(positionals);
    let args = match Args::try_parse_from(cmdline) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(EXIT_SETUP);
        }
    };

    init_logger(args.verbose);

    match run(&args) {
        Ok(state) => println!("{}", state.data),
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_usage() {
                print_usage();
            }
            process::exit(e.exit_code());
        }
    }
}

fn run(args: &Args) -> i2cget_block::Result<State> {
    let bus = lookup_bus(&args.bus)?;
    let address = parse_address(&args.address)?;
    let register = args.register.as_deref().map(parse_register).transpose()?;

    let options = Options::new(bus, address)
        .with_register(register)
        .with_force(args.force)
        .with_size_arg(args.size.as_deref())?;

    log::debug!("options: {:?}", options);

    LinuxOpener::default().read_block(&options)
}

/// Split off the leading tokens that start with `-`.
fn split_leading_flags(args: Vec<OsString>) -> (Vec<OsString>, Vec<OsString>) {
    let count = args
        .iter()
        .take_while(|arg| arg.to_str().is_some_and(|s| s.starts_with('-')))
        .count();
    let mut flags = args;
    let positionals = flags.split_off(count);
    (flags, positionals)
}

/// Whether `-V` appears among the leading flags before any unknown one.
fn requests_version(flags: &[OsString]) -> bool {
    for flag in flags {
        match flag.to_str() {
            Some("-V") | Some("--version") => return true,
            Some("-f") | Some("--force") | Some("--verbose") => {}
            Some(s) if s.len() > 1 && s[1..].chars().all(|c| c == 'v') => {}
            _ => return false,
        }
    }
    false
}

fn init_logger(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format(|buf, record| match record.level() {
        log::Level::Warn => writeln!(buf, "Warning: {}", record.args()),
        level => writeln!(buf, "{}: {}", level, record.args()),
    });

    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }

    builder.init();
}

fn print_usage() {
    eprintln!("Usage: {}", USAGE);
    eprintln!("  I2CBUS is an integer or an I2C bus name");
    eprintln!("  ADDRESS is an integer (0x03 - 0x77)");
    eprintln!("  DATA-ADDRESS is an integer (0x00 - 0xff)");
    eprintln!(
        "  SIZE is a number ({} .. {}) of bytes to read, append p to enable PEC",
        MIN_BLOCK_SIZE, MAX_BLOCK_SIZE
    );
}
