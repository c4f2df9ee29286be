// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::env;
use std::fs;
use std::process::ExitCode;

use mathcompress::{compress, decompress, inspect};

const USAGE: &str = "usage:
  mathcompress compress <input.png|pnm> <output.mc2> [quality] [downsample]
  mathcompress decompress <input.mc2> <output.png>
  mathcompress inspect <input.mc2>";

fn parse_arg(args: &[String], index: usize, default: u8) -> Result<u8, String> {
    args.get(index).map_or(Ok(default), |s| {
        s.parse()
            .map_err(|_| format!("not a number in [0, 255]: {s}"))
    })
}

fn run(args: &[String]) -> Result<(), String> {
    let read = |path: &String| fs::read(path).map_err(|e| format!("reading {path}: {e}"));
    let write =
        |path: &String, data: &[u8]| fs::write(path, data).map_err(|e| format!("writing {path}: {e}"));
    match args {
        [_, cmd, input, output, ..] if cmd == "compress" && args.len() <= 6 => {
            let quality = parse_arg(args, 4, 50)?;
            let downsample = parse_arg(args, 5, 2)?;
            let (container, stats) =
                compress(&read(input)?, quality, downsample).map_err(|e| e.to_string())?;
            write(output, &container)?;
            println!(
                "{} -> {} bytes, ratio {:.2}, saved {:.1}%, PSNR {:.2} dB",
                stats.original_size, stats.compressed_size, stats.ratio, stats.space_saving, stats.psnr
            );
            println!(
                "{} symbols, {} distinct, {} payload bits",
                stats.symbol_count, stats.alphabet_size, stats.payload_bits
            );
        }
        [_, cmd, input, output] if cmd == "decompress" => {
            let png = decompress(&read(input)?).map_err(|e| e.to_string())?;
            write(output, &png)?;
        }
        [_, cmd, input] if cmd == "inspect" => {
            let info = inspect(&read(input)?).map_err(|e| e.to_string())?;
            println!("Image size: {} x {}", info.width, info.height);
            println!(
                "Layout: {:?}, quality {}, downsample {}, block size {}",
                info.layout, info.quality, info.downsample, info.block_size
            );
            println!(
                "Code table: {} symbols, longest code {} bits",
                info.alphabet_size, info.max_code_length
            );
            println!(
                "Payload: {} symbols in {} bits, container {} bytes",
                info.symbol_count, info.bit_count, info.container_size
            );
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
