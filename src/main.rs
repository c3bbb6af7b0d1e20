use std::{
    env, fs,
    io::{self, Read, Write},
    path::Path,
    process::{Command, ExitCode},
    rc::Rc,
    time::Instant,
};

use anyhow::{bail, Context as _, Result};
use inkwell::{context::Context, targets::FileType};
use pclc::{
    compiler::{
        compiler::{compile, Compiler},
        stdlib::declared_runtime_functions,
    },
    config::{CompileOptions, Emit, Stage, USAGE},
    display_error, display_warning,
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check_with,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let options = match CompileOptions::from_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("error: {:#}\n\n{}", error, USAGE);
            return ExitCode::from(2);
        }
    };

    if options.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    if options.version {
        println!("pclc {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_tracing(options.verbose);

    match run(&options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs the pipeline. Returns `false` when the program had errors, which
/// have been reported already.
fn run(options: &CompileOptions) -> Result<bool> {
    let (source, file_name) = match &options.input {
        Some(path) => (
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            (source, String::from("<stdin>"))
        }
    };

    let start = Instant::now();

    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            display_error(&error, &source);
            return Ok(false);
        }
    };
    info!("Tokenized in {:?}", start.elapsed());

    if options.stop_after == Stage::Lex {
        println!("{:#?}", tokens);
        return Ok(true);
    }

    let parse_start = Instant::now();
    let (_, program) = parse(tokens, Rc::new(file_name));
    let program = match program {
        Ok(program) => program,
        Err(error) => {
            display_error(&error, &source);
            return Ok(false);
        }
    };
    info!("Parsed in {:?}", parse_start.elapsed());

    if options.stop_after == Stage::Parse {
        println!("{:#?}", program);
        return Ok(true);
    }

    let type_check_start = Instant::now();
    let (type_checker, typed) = type_check_with(&program, options.fail_fast);

    for warning in type_checker.warnings.iter() {
        display_warning(warning, &source);
    }

    let typed = match typed {
        Ok(typed) => typed,
        Err(errors) => {
            for error in errors.iter() {
                display_error(error, &source);
            }
            return Ok(false);
        }
    };
    info!("Type checked in {:?}", type_check_start.elapsed());

    if options.stop_after == Stage::Sem {
        return Ok(true);
    }

    let compile_start = Instant::now();
    let context = Context::create();
    let compiler = match compile(&typed, &context, options.optimization) {
        Ok(compiler) => compiler,
        Err(error) => {
            display_error(&error, &source);
            return Ok(false);
        }
    };
    info!("Compiled in {:?}", compile_start.elapsed());
    info!(
        "Runtime routines used: {:?}",
        declared_runtime_functions(&compiler)
    );

    emit(&compiler, options)?;
    info!("Total time: {:?}", start.elapsed());

    Ok(true)
}

fn emit(compiler: &Compiler, options: &CompileOptions) -> Result<()> {
    let emit = match (options.stop_after, options.emit) {
        (Stage::Codegen, Emit::Bin) => Emit::Ir,
        (_, emit) => emit,
    };

    if options.to_stdout {
        let output = match emit {
            Emit::Ir => compiler.ir().into_bytes(),
            Emit::Asm => compiler
                .write_to_memory(FileType::Assembly)
                .map_err(internal)?,
            Emit::Obj | Emit::Bin => compiler
                .write_to_memory(FileType::Object)
                .map_err(internal)?,
        };
        io::stdout().write_all(&output)?;
        return Ok(());
    }

    let output = options.output_path(emit);
    match emit {
        Emit::Ir => compiler.save_module_to_file(&output).map_err(internal)?,
        Emit::Asm => compiler
            .write_to_file(FileType::Assembly, &output)
            .map_err(internal)?,
        Emit::Obj => compiler
            .write_to_file(FileType::Object, &output)
            .map_err(internal)?,
        Emit::Bin => {
            let object = output.with_extension("o");
            compiler
                .write_to_file(FileType::Object, &object)
                .map_err(internal)?;
            let linked = link(&object, &output, options);
            fs::remove_file(&object).ok();
            linked?;
        }
    }

    info!("Wrote {}", output.display());
    Ok(())
}

/// Output failures carry no useful source position.
fn internal(error: Error) -> anyhow::Error {
    anyhow::Error::new(error.get_internal_error().clone())
}

/// Links the object file with the runtime library and libm.
fn link(object: &Path, output: &Path, options: &CompileOptions) -> Result<()> {
    let mut command = Command::new(&options.linker);
    command.arg(object);
    if let Some(runtime) = &options.runtime {
        command.arg(runtime);
    }
    command.arg("-lm").arg("-o").arg(output);

    info!("Linking with {:?}", command);
    let result = command
        .output()
        .with_context(|| format!("failed to run the linker `{}`", options.linker))?;

    if !result.status.success() {
        bail!(
            "linking failed:\n{}",
            String::from_utf8_lossy(&result.stderr)
        );
    }

    Ok(())
}
