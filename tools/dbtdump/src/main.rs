//! dbtdump — disassemble and dry-translate flat ARM code images.
//!
//! Reads a little-endian A32 image, prints its disassembly, and with
//! `--translate` runs the translation engine over it (nothing is
//! executed) reporting units, bytes emitted and trampolines created.

use std::env;
use std::fs;
use std::process;

use dbt_core::EngineConfig;
use dbt_disas::disasm_word;
use dbt_engine as engine;
use log::error;

struct Args {
    image_path: String,
    start: u64,
    count: Option<usize>,
    translate: bool,
}

const USAGE: &str = "\
usage: dbtdump <image> [options]

Options:
  --start <hex>   Address the image is loaded at (default: 0x8000)
  --count <n>     Max instructions to print
  --translate     Dry-run the translation engine over the image
  -h, --help      Show this help";

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("{USAGE}");
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut a = Args {
        image_path: args[1].clone(),
        start: 0x8000,
        count: None,
        translate: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--start" => {
                i += 1;
                let s = args[i].trim_start_matches("0x");
                a.start = u64::from_str_radix(s, 16).unwrap_or_else(|_| {
                    eprintln!("invalid hex address: {}", args[i]);
                    process::exit(1);
                });
            }
            "--count" => {
                i += 1;
                a.count = Some(args[i].parse().unwrap_or_else(|_| {
                    eprintln!("invalid count: {}", args[i]);
                    process::exit(1);
                }));
            }
            "--translate" => a.translate = true,
            other => {
                eprintln!("unknown option: {other}");
                eprintln!("{USAGE}");
                process::exit(1);
            }
        }
        i += 1;
    }
    a
}

fn dump_disassembly(image: &[u8], start: u64, count: Option<usize>) {
    let limit = count.unwrap_or(usize::MAX);
    for (n, chunk) in image.chunks_exact(4).enumerate() {
        if n >= limit {
            break;
        }
        let addr = start + (n as u64) * 4;
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        println!("{addr:#010x}:  {word:08x}  {}", disasm_word(word, addr as u32));
    }
}

/// Walk the image unit by unit through the engine. Unit entries are
/// discovered in stream order: the image start, then each unit's
/// fall-through continuation.
fn dry_translate(image: &[u8]) -> Result<(), dbt_core::TranslationError> {
    // work on a copy with a final bx lr, so an image that does not
    // end in a control transfer still terminates its last unit
    let mut code: Vec<u8> = image[..image.len() & !3].to_vec();
    code.extend_from_slice(&0xe12f_ff1eu32.to_le_bytes());

    let mut tld = engine::init(EngineConfig::default())?;
    let base = code.as_ptr() as usize;
    let end = base + code.len();

    let mut entry = base;
    let mut unit = 0usize;
    while entry < end {
        if tld.forward_cache().lookup(entry).is_some() {
            break;
        }
        let transl = engine::translate_block(&mut tld, entry)?;
        println!("unit {unit}: source {entry:#x} -> cache {transl:#x}");
        unit += 1;
        let next = tld.last_continuation();
        if next <= entry || next >= end {
            break;
        }
        entry = next;
    }

    let stats = tld.stats();
    println!(
        "{} units, {} bytes emitted, {} trampolines",
        stats.blocks,
        stats.bytes,
        tld.trampolines().created()
    );
    engine::exit(tld);
    Ok(())
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let image = match fs::read(&args.image_path) {
        Ok(data) => data,
        Err(e) => {
            error!("cannot read {}: {e}", args.image_path);
            process::exit(1);
        }
    };
    if image.len() < 4 {
        error!("{}: image too small", args.image_path);
        process::exit(1);
    }

    dump_disassembly(&image, args.start, args.count);

    if args.translate {
        if let Err(e) = dry_translate(&image) {
            error!("translation failed: {e}");
            process::exit(1);
        }
    }
}
