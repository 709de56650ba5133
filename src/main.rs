//! `bufmgr` command-line driver.
//!
//! ```text
//! bufmgr dump <page-file>
//! bufmgr replay <config.toml> <op>...
//! ```
//!
//! Replay ops: `p<n>` pin, `u<n>` unpin, `d<n>` mark dirty, `f<n>` force,
//! `F` flush the whole pool. Log verbosity follows `RUST_LOG`.

use std::env;
use std::process::ExitCode;

use bufmgr::{
    BlockStore, BufferPoolConfig, BufferPoolManager, DiskManager, Error, Page, PageId, Result,
};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

const USAGE: &str = "usage:
  bufmgr dump <page-file>
  bufmgr replay <config.toml> <op>...    (ops: p<n> u<n> d<n> f<n> F)";

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.split_first() {
        Some((cmd, rest)) if cmd == "dump" && rest.len() == 1 => dump(&rest[0]),
        Some((cmd, rest)) if cmd == "replay" && !rest.is_empty() => replay(&rest[0], &rest[1..]),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays clean for command output.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Print every block of a page file with its leading text and checksum.
fn dump(path: &str) -> Result<()> {
    let mut store = DiskManager::open(path)?;
    let mut page = Page::new();

    println!("{}: {} pages", store.location(), store.page_count());
    for id in 0..store.page_count() {
        let page_id = PageId::new(id);
        store.read_block(page_id, &mut page)?;
        println!(
            "{:>6}  crc32={:#010x}  {:?}",
            id,
            page.checksum(),
            page.leading_text()
        );
    }
    Ok(())
}

/// A single replay step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pin(PageId),
    Unpin(PageId),
    Dirty(PageId),
    Force(PageId),
    Flush,
}

fn parse_op(token: &str) -> Result<Op> {
    if token == "F" {
        return Ok(Op::Flush);
    }

    let bad = || Error::Configuration(format!("unrecognized op '{}'", token));
    let mut chars = token.chars();
    let kind = chars.next().ok_or_else(bad)?;
    let number: i64 = chars.as_str().parse().map_err(|_| bad())?;
    let page_id = PageId::try_from(number)?;

    match kind {
        'p' => Ok(Op::Pin(page_id)),
        'u' => Ok(Op::Unpin(page_id)),
        'd' => Ok(Op::Dirty(page_id)),
        'f' => Ok(Op::Force(page_id)),
        _ => Err(bad()),
    }
}

/// Run `tokens` against a pool opened from `config_path`.
///
/// The pool content is printed after every op. Pins stay held until a
/// matching `u<n>`; the final shutdown fails if any are left.
fn replay(config_path: &str, tokens: &[String]) -> Result<()> {
    let ops = tokens
        .iter()
        .map(|t| parse_op(t))
        .collect::<Result<Vec<_>>>()?;

    let config = BufferPoolConfig::load_from_file(config_path)?;
    let mut pool = BufferPoolManager::from_config(&config)?;
    info!(ops = ops.len(), policy = %pool.policy(), "replaying");

    for (token, op) in tokens.iter().zip(&ops) {
        match *op {
            Op::Pin(page_id) => {
                // Released by an explicit u<n>.
                pool.pin_page(page_id)?;
            }
            Op::Unpin(page_id) => pool.unpin_page(page_id)?,
            Op::Dirty(page_id) => pool.mark_dirty(page_id)?,
            Op::Force(page_id) => pool.force_page(page_id)?,
            Op::Flush => pool.force_flush_pool()?,
        }
        println!("{:<6} {}", token, pool.pool_content());
    }

    println!("read IO: {}", pool.num_read_io());
    println!("write IO: {}", pool.num_write_io());
    println!("{}", pool.stats().snapshot());

    pool.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ops() {
        assert_eq!(parse_op("p3").unwrap(), Op::Pin(PageId::new(3)));
        assert_eq!(parse_op("u12").unwrap(), Op::Unpin(PageId::new(12)));
        assert_eq!(parse_op("d0").unwrap(), Op::Dirty(PageId::new(0)));
        assert_eq!(parse_op("f7").unwrap(), Op::Force(PageId::new(7)));
        assert_eq!(parse_op("F").unwrap(), Op::Flush);
    }

    #[test]
    fn test_parse_bad_ops() {
        assert!(parse_op("").is_err());
        assert!(parse_op("x1").is_err());
        assert!(parse_op("p").is_err());
        assert!(matches!(parse_op("p-1"), Err(Error::InvalidPageNumber(-1))));
    }
}
