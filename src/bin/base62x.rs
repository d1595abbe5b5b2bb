/*
 * Copyright (C) 2025 taylor.fish <contact@taylor.fish>
 *
 * This file is part of Base62x.
 *
 * Base62x is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Base62x is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with Base62x. If not, see <https://www.gnu.org/licenses/>.
 */

use std::ffi::OsStr;
use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::{stdin, stdout, BufWriter, Read, Stdout, Write};
use std::path::Path;
use std::process::exit;

use base62x::{Codec, FlatCodec, Tag, Transcoder};

const USAGE: &str = "\
Usage: base62x [options] [file]

Encodes or decodes Base62x data from [file] and writes the result to standard
output. If [file] is missing or \"-\", the data is read from standard input.

Options:
  -d --decode   Decode data instead of encoding
  -t --tag <c>  Use <c> as the tag character (default: x)
  --flat        Transform through the flat-buffer engine
  -h --help     Show this help message
  -v --version  Show program version
";

#[macro_use]
mod error_exit {
    use super::{exit, Display};

    macro_rules! error_exit {
        ($($args:tt)*) => {
            crate::error_exit::__run(format_args!($($args)*));
        };
    }

    #[doc(hidden)]
    pub fn __run(args: impl Display) -> ! {
        eprintln!("error: {}", args);
        if cfg!(feature = "cli-panic") {
            panic!("error: {}", args);
        } else {
            exit(1);
        }
    }
}

fn expect<T, E: Debug>(result: Result<T, E>, msg: impl Display) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {}", msg);
        if cfg!(feature = "cli-panic") {
            panic!("error: {}: {:?}", msg, e);
        } else {
            exit(1);
        }
    })
}

struct ParsedArgs<'a> {
    pub decode: bool,
    pub flat: bool,
    pub tag: Tag,
    pub path: Option<&'a Path>,
}

fn show_usage() -> ! {
    print!("{}", USAGE);
    exit(0);
}

fn show_version() -> ! {
    println!("{}", env!("CARGO_PKG_VERSION"));
    exit(0);
}

macro_rules! args_error {
    ($($args:tt)*) => {
        error_exit!(
            "{}\n{}",
            format_args!($($args)*),
            "See `base62x --help` for usage information.",
        );
    };
}

fn parse_args<'a, Args>(args: Args) -> ParsedArgs<'a>
where
    Args: IntoIterator<Item = &'a OsStr>,
{
    let mut decode = false;
    let mut flat = false;
    let mut tag: Option<Tag> = None;
    let mut file: Option<&'a OsStr> = None;
    let mut options_done = false;
    let mut tag_pending = false;

    let mut process_arg = |arg: &'a OsStr, astr: &str| {
        if tag_pending {
            tag_pending = false;
            let parsed = match astr.parse() {
                Ok(t) => t,
                Err(e) => {
                    args_error!("invalid tag: {}", e);
                }
            };
            if tag.replace(parsed).is_some() {
                args_error!("tag specified more than once");
            }
            return;
        }
        match astr {
            _ if options_done => {}
            "-" => {}
            "--" => {
                options_done = true;
                return;
            }
            "--help" => show_usage(),
            "--version" => show_version(),
            "--decode" => {
                decode = true;
                return;
            }
            "--flat" => {
                flat = true;
                return;
            }
            "--tag" => {
                tag_pending = true;
                return;
            }
            s if s.starts_with("--") => {
                args_error!("unrecognized option: {}", s);
            }
            s if s.starts_with('-') => {
                s.chars().skip(1).for_each(|c| match c {
                    'h' => show_usage(),
                    'v' => show_version(),
                    'd' => {
                        decode = true;
                    }
                    't' => {
                        tag_pending = true;
                    }
                    c => {
                        args_error!("unrecognized option: -{}", c);
                    }
                });
                return;
            }
            _ => {}
        }
        if file.replace(arg).is_some() {
            args_error!("unexpected argument: {}", astr);
        }
    };

    args.into_iter()
        .map(|a| (a, a.to_string_lossy()))
        .for_each(|(arg, astr)| process_arg(arg, &*astr));

    if tag_pending {
        args_error!("missing value for --tag");
    }

    ParsedArgs {
        decode,
        flat,
        tag: tag.unwrap_or_default(),
        path: file.map(Path::new),
    }
}

fn flush_stdout(writer: &mut BufWriter<Stdout>) {
    expect(writer.flush(), "could not write to standard output");
}

fn read_input(stream: &mut impl Read) -> Vec<u8> {
    let mut data = Vec::new();
    expect(stream.read_to_end(&mut data), "could not read input");
    data
}

fn encode(codec: &mut dyn Transcoder, data: &[u8]) {
    let encoded = codec.encode_bytes(data);
    let mut writer = BufWriter::new(stdout());
    expect(
        writer.write_all(encoded.as_bytes()),
        "could not write to standard output",
    );
    flush_stdout(&mut writer);
}

fn decode(codec: &mut dyn Transcoder, data: &[u8]) {
    let text = expect(
        std::str::from_utf8(data),
        "input is not valid base62x data",
    );
    match codec.decode_bytes(text) {
        Ok(bytes) => {
            let mut writer = BufWriter::new(stdout());
            expect(
                writer.write_all(&bytes),
                "could not write to standard output",
            );
            flush_stdout(&mut writer);
        }
        Err(e) => {
            error_exit!("input is not valid base62x data: {}", e);
        }
    }
}

fn main() {
    let args: Vec<_> = std::env::args_os().skip(1).collect();
    let ParsedArgs {
        decode: should_decode,
        flat,
        tag,
        path,
    } = parse_args(args.iter().map(|s| s.as_os_str()));

    let mut codec: Box<dyn Transcoder> = if flat {
        Box::new(FlatCodec::with_tag(tag))
    } else {
        Box::new(Codec::with_tag(tag))
    };

    let data = path
        .map(|path| {
            let mut file = File::open(path).unwrap_or_else(|e| {
                error_exit!(
                    "could not open file '{}': {}",
                    path.display(),
                    e,
                );
            });
            read_input(&mut file)
        })
        .unwrap_or_else(|| read_input(&mut stdin()));

    if should_decode {
        decode(&mut *codec, &data);
    } else {
        encode(&mut *codec, &data);
    }
}
