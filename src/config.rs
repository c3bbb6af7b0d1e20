//! Command line configuration of the driver.

use std::{env, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};

/// The last stage of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Lex,
    Parse,
    Sem,
    Codegen,
    Bin,
}

/// What the code generator writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Ir,
    Asm,
    Obj,
    Bin,
}

impl Emit {
    pub fn extension(&self) -> &'static str {
        match self {
            Emit::Ir => "ll",
            Emit::Asm => "s",
            Emit::Obj => "o",
            Emit::Bin => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Source file, stdin when absent.
    pub input: Option<PathBuf>,
    pub stop_after: Stage,
    pub optimization: u32,
    pub emit: Emit,
    /// Write the IR or assembly to stdout instead of a file.
    pub to_stdout: bool,
    pub output: Option<PathBuf>,
    /// Object file or archive with the runtime library routines.
    pub runtime: Option<PathBuf>,
    pub linker: String,
    pub fail_fast: bool,
    pub verbose: bool,
    pub help: bool,
    pub version: bool,
}

pub const USAGE: &str = "\
usage: pclc [options] [file]

  --pipeline STAGE   stop after lex, parse, sem, codegen or bin
  -O LEVEL           optimization level 0 to 3
  --emit KIND        write ir, asm, obj or bin (default bin)
  -i                 read stdin, write the IR to stdout
  -f                 read stdin, write the assembly to stdout
  -p                 read stdin, write the emitted IR, assembly or object to stdout
  -o PATH            output file
  --runtime PATH     runtime library to link against
  --linker CMD       linker driver (default cc, or $PCLC_LINKER)
  --fail-fast        stop at the first semantic error
  --verbose          log the stages of the compilation
  -v, --version      print the version
  -h, --help         print this message";

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            input: None,
            stop_after: Stage::Bin,
            optimization: 0,
            emit: Emit::Bin,
            to_stdout: false,
            output: None,
            runtime: None,
            linker: env::var("PCLC_LINKER").unwrap_or_else(|_| String::from("cc")),
            fail_fast: false,
            verbose: false,
            help: false,
            version: false,
        }
    }
}

impl CompileOptions {
    /// Parses the arguments that follow the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut options = CompileOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("`{}` expects a value", flag))
            };

            match arg.as_str() {
                "--pipeline" => options.stop_after = parse_stage(&value("--pipeline")?)?,
                "--emit" => options.emit = parse_emit(&value("--emit")?)?,
                "-O" => options.optimization = parse_level(&value("-O")?)?,
                "-o" => options.output = Some(PathBuf::from(value("-o")?)),
                "--runtime" => options.runtime = Some(PathBuf::from(value("--runtime")?)),
                "--linker" => options.linker = value("--linker")?,
                "-i" => {
                    options.emit = Emit::Ir;
                    options.to_stdout = true;
                }
                "-f" => {
                    options.emit = Emit::Asm;
                    options.to_stdout = true;
                }
                "-p" => options.to_stdout = true,
                "--fail-fast" => options.fail_fast = true,
                "--verbose" => options.verbose = true,
                "-v" | "--version" => options.version = true,
                "-h" | "--help" => options.help = true,
                level if level.starts_with("-O") => {
                    options.optimization = parse_level(&level[2..])?
                }
                flag if flag.starts_with('-') => bail!("unknown option `{}`", flag),
                path => {
                    if options.input.is_some() {
                        bail!("more than one input file given");
                    }
                    options.input = Some(PathBuf::from(path));
                }
            }
        }

        // Writing to stdout reads from stdin.
        if options.to_stdout {
            options.input = None;
        }

        Ok(options)
    }

    /// Where an artifact of kind `emit` is written.
    ///
    /// Defaults to the input's path with the artifact's extension, or to
    /// `a.out`/`out.<ext>` when reading stdin.
    pub fn output_path(&self, emit: Emit) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }

        match (&self.input, emit) {
            (Some(input), _) => input.with_extension(emit.extension()),
            (None, Emit::Bin) => PathBuf::from("a.out"),
            (None, _) => PathBuf::from("out").with_extension(emit.extension()),
        }
    }
}

fn parse_stage(stage: &str) -> Result<Stage> {
    Ok(match stage {
        "lex" => Stage::Lex,
        "parse" => Stage::Parse,
        "sem" => Stage::Sem,
        "codegen" => Stage::Codegen,
        "bin" => Stage::Bin,
        _ => bail!("unknown pipeline stage `{}`", stage),
    })
}

fn parse_emit(emit: &str) -> Result<Emit> {
    Ok(match emit {
        "ir" => Emit::Ir,
        "asm" => Emit::Asm,
        "obj" => Emit::Obj,
        "bin" => Emit::Bin,
        _ => bail!("unknown output kind `{}`", emit),
    })
}

fn parse_level(level: &str) -> Result<u32> {
    let level = level
        .parse::<u32>()
        .with_context(|| format!("invalid optimization level `{}`", level))?;

    if level > 3 {
        bail!("optimization level must be between 0 and 3, got {}", level);
    }

    Ok(level)
}
