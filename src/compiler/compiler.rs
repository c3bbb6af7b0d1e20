//! Main compiler module.
//!
//! This module contains the core Compiler structure and implements the compilation
//! pipeline from typed AST to LLVM IR. It manages the LLVM context, module and
//! builder, the static storage of every variable, type conversion and the
//! optimization passes.

use std::{collections::HashMap, path::Path};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    passes::PassManager,
    targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::{FunctionValue, PointerValue},
    AddressSpace, OptimizationLevel,
};
use tracing::debug;

use crate::{
    ast::types::{ScalarType, Type},
    errors::errors::Error,
    type_checker::typed_ast::{TypedBody, TypedDecl, TypedFormal, TypedHeader, TypedProgram},
    Position,
};

use super::stmt::gen_block;

/// Where a named variable lives.
#[derive(Debug, Clone, Copy)]
pub enum Storage<'a> {
    /// A global slot holding the value itself.
    Slot(PointerValue<'a>),
    /// A global cell holding the handle of a by-reference formal.
    Reference(PointerValue<'a>),
}

/// State of the function currently being lowered.
pub struct FunctionContext<'a> {
    pub function: FunctionValue<'a>,
    /// Every exit of the function branches here.
    pub return_block: BasicBlock<'a>,
    pub labels: HashMap<String, BasicBlock<'a>>,
}

/// The main compiler structure that holds the state of the compilation process.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Map of storage symbols to their global slots
    pub named_storage: HashMap<String, Storage<'a>>,
    /// Stack of functions being lowered, innermost last
    pub functions: Vec<FunctionContext<'a>>,
    pub optimization: u32,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    /// Host target, used for the data layout and for emitting code
    pub target_machine: Option<TargetMachine>,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance with an empty module named `module_name`.
    pub fn new(context: &'a Context, module_name: &str, optimization: u32) -> Self {
        Compiler {
            named_storage: HashMap::new(),
            functions: vec![],
            optimization,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            context,
            target_machine: None,
        }
    }

    /// The LLVM IR of the module as text.
    pub fn ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Saves the current LLVM module to a file.
    pub fn save_module_to_file(&self, output_file: &Path) -> Result<(), Error> {
        self.module
            .print_to_file(output_file)
            .map_err(|error| Error::codegen(error.to_string(), Position::null()))
    }

    /// Emits assembly or an object file for the host target.
    pub fn write_to_file(&self, file_type: FileType, output_file: &Path) -> Result<(), Error> {
        self.host_machine()?
            .write_to_file(&self.module, file_type, output_file)
            .map_err(|error| Error::codegen(error.to_string(), Position::null()))
    }

    /// Emits assembly or object code for the host target into memory.
    pub fn write_to_memory(&self, file_type: FileType) -> Result<Vec<u8>, Error> {
        let buffer = self
            .host_machine()?
            .write_to_memory_buffer(&self.module, file_type)
            .map_err(|error| Error::codegen(error.to_string(), Position::null()))?;

        Ok(buffer.as_slice().to_vec())
    }

    fn host_machine(&self) -> Result<&TargetMachine, Error> {
        self.target_machine
            .as_ref()
            .ok_or_else(|| Error::codegen("no target machine for the host", Position::null()))
    }

    /// Maps the optimization level to LLVM's.
    pub fn optimization_level(&self) -> OptimizationLevel {
        match self.optimization {
            0 => OptimizationLevel::None,
            1 => OptimizationLevel::Less,
            2 => OptimizationLevel::Default,
            _ => OptimizationLevel::Aggressive,
        }
    }

    /// Runs optimization passes on the LLVM module.
    ///
    /// Level 0 only verifies. Higher levels promote the storage slots of
    /// loaded values to registers and clean up, level 2 and up also drop dead
    /// code and inline small routines.
    fn run_passes(&self) {
        if self.optimization == 0 {
            return;
        }

        let fpm = PassManager::create(());

        fpm.add_promote_memory_to_register_pass();
        fpm.add_instruction_combining_pass();
        fpm.add_reassociate_pass(); // Reorder expressions to enable better optimizations
        fpm.add_gvn_pass(); // Eliminate redundant calculations
        fpm.add_cfg_simplification_pass(); // Simplify the control flow graph
        if self.optimization >= 2 {
            fpm.add_function_inlining_pass();
            fpm.add_aggressive_dce_pass();
            fpm.add_cfg_simplification_pass();
        }
        fpm.add_verifier_pass();

        fpm.run_on(&self.module);
    }

    /// Sets the host triple and data layout on the module.
    fn initialize_target(&mut self) -> Result<(), Error> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|error| Error::codegen(error, Position::null()))?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple)
            .map_err(|error| Error::codegen(error.to_string(), Position::null()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                self.optimization_level(),
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                Error::codegen("could not create a target machine", Position::null())
            })?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());
        self.target_machine = Some(target_machine);

        Ok(())
    }

    /// Lowers the program: storage and prototypes first, then every routine,
    /// then `main`.
    fn gen(&mut self, program: &TypedProgram) -> Result<(), Error> {
        self.declare_body(&program.body)?;
        self.gen_routines(&program.body)?;

        let function = self.create_function(
            "main",
            self.context.i32_type().fn_type(&[], false),
            None,
        );
        let return_block = self.create_basic_block(function, "return");
        self.functions.push(FunctionContext {
            function,
            return_block,
            labels: HashMap::new(),
        });

        gen_block(self, &program.body.block)?;
        self.branch_if_open(return_block)?;

        self.builder.position_at_end(return_block);
        self.builder
            .build_return(Some(&self.context.i32_type().const_zero()))?;
        self.functions.pop();

        Ok(())
    }

    /// Creates the global slots and function prototypes of a body and of
    /// every routine nested in it.
    fn declare_body(&mut self, body: &TypedBody) -> Result<(), Error> {
        for decl in body.decls.iter() {
            match decl {
                TypedDecl::Variable { storage, ty, .. } => {
                    self.create_slot(storage, ty)?;
                }
                TypedDecl::Forward(header) => self.declare_prototype(header)?,
                TypedDecl::Routine(routine) => {
                    self.declare_formals(&routine.header)?;
                    self.declare_prototype(&routine.header)?;
                    self.declare_body(&routine.body)?;
                }
            }
        }

        Ok(())
    }

    /// Creates the slots and cells of a definition's formals and result.
    ///
    /// Only definitions own storage. A forward header may name its formals
    /// differently, and those names never reach the routine's body.
    fn declare_formals(&mut self, header: &TypedHeader) -> Result<(), Error> {
        for formal in header.formals.iter() {
            if formal.by_reference {
                self.create_cell(&formal.storage, &formal.ty)?;
            } else {
                self.create_slot(&formal.storage, &formal.ty)?;
            }
        }

        if let (Some(storage), Some(return_type)) = (&header.result_storage, &header.return_type) {
            self.create_slot(storage, return_type)?;
        }

        Ok(())
    }

    /// A forward declaration and its definition share the function, so
    /// whichever comes first creates it.
    fn declare_prototype(&mut self, header: &TypedHeader) -> Result<(), Error> {
        if self.module.get_function(&header.storage).is_some() {
            return Ok(());
        }

        let function_type =
            self.function_type(&header.formals, header.return_type.as_ref(), false)?;
        let function = self.create_function_proto(&header.storage, function_type);
        debug!("Declared routine {} as {}", header.name, header.storage);

        // Routines are only visible to this module.
        function.set_linkage(Linkage::Internal);

        Ok(())
    }

    /// Lowers every routine nested in `body`, innermost first.
    fn gen_routines(&mut self, body: &TypedBody) -> Result<(), Error> {
        for decl in body.decls.iter() {
            if let TypedDecl::Routine(routine) = decl {
                self.gen_routines(&routine.body)?;
                self.gen_routine(&routine.header, &routine.body)?;
            }
        }

        Ok(())
    }

    fn gen_routine(&mut self, header: &TypedHeader, body: &TypedBody) -> Result<(), Error> {
        debug!("Lowering routine {}", header.storage);

        let function = self.module.get_function(&header.storage).ok_or_else(|| {
            Error::codegen(
                format!("routine `{}` has no prototype", header.name),
                body.span.start.clone(),
            )
        })?;

        let entry = self.create_basic_block(function, "entry");
        let return_block = self.create_basic_block(function, "return");
        self.builder.position_at_end(entry);

        // By-value arguments are copied into their slots, handles into their cells.
        for (index, formal) in header.formals.iter().enumerate() {
            let parameter = function.get_nth_param(index as u32).ok_or_else(|| {
                Error::codegen(
                    format!("missing parameter `{}`", formal.name),
                    body.span.start.clone(),
                )
            })?;
            let handle = match self.storage(&formal.storage)? {
                Storage::Slot(slot) => slot,
                Storage::Reference(cell) => cell,
            };
            self.builder.build_store(handle, parameter)?;
        }

        self.functions.push(FunctionContext {
            function,
            return_block,
            labels: HashMap::new(),
        });

        gen_block(self, &body.block)?;
        self.branch_if_open(return_block)?;

        self.builder.position_at_end(return_block);
        match &header.result_storage {
            Some(storage) => {
                let Storage::Slot(slot) = self.storage(storage)? else {
                    return Err(Error::codegen(
                        "result is not a value slot",
                        body.span.end.clone(),
                    ));
                };
                let value = self.builder.build_load(slot, "result")?;
                self.builder.build_return(Some(&value))?;
            }
            None => {
                self.builder.build_return(None)?;
            }
        }

        self.functions.pop();

        Ok(())
    }

    /// Converts a PCL type to an LLVM basic type.
    pub fn convert_type(&self, ty: &Type) -> Result<BasicTypeEnum<'a>, Error> {
        Ok(match ty {
            Type::Scalar(ScalarType::Integer) => self.context.i32_type().into(),
            Type::Scalar(ScalarType::Real) => self.context.f64_type().into(),
            Type::Scalar(ScalarType::Boolean) => self.context.bool_type().into(),
            Type::Scalar(ScalarType::Char) => self.context.i8_type().into(),
            Type::Pointer(pointee) => self
                .convert_type(pointee)?
                .ptr_type(AddressSpace::default())
                .into(),
            Type::ConstArray(length, element) => {
                self.convert_type(element)?.array_type(*length).into()
            }
            Type::VarArray(element) => self.convert_type(element)?.array_type(0).into(),
            Type::Nil => self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into(),
            Type::Label | Type::Procedure | Type::Function(_) => {
                return Err(Error::codegen(
                    format!("type `{}` has no storage", ty),
                    Position::null(),
                ))
            }
        })
    }

    /// The LLVM type a formal is passed as.
    ///
    /// References are pointers to the formal's type. Runtime routines take
    /// unsized arrays as a plain pointer to their first element.
    pub fn formal_type(
        &self,
        formal: &TypedFormal,
        external: bool,
    ) -> Result<BasicTypeEnum<'a>, Error> {
        if !formal.by_reference {
            return self.convert_type(&formal.ty);
        }

        let pointee = match (&formal.ty, external) {
            (Type::VarArray(element), true) => self.convert_type(element)?,
            (ty, _) => self.convert_type(ty)?,
        };

        Ok(pointee.ptr_type(AddressSpace::default()).into())
    }

    pub fn function_type(
        &self,
        formals: &[TypedFormal],
        return_type: Option<&Type>,
        external: bool,
    ) -> Result<FunctionType<'a>, Error> {
        let parameters = formals
            .iter()
            .map(|formal| self.formal_type(formal, external).map(|ty| ty.into()))
            .collect::<Result<Vec<BasicMetadataTypeEnum>, Error>>()?;

        Ok(match return_type {
            Some(return_type) => self.convert_type(return_type)?.fn_type(&parameters, false),
            None => self.context.void_type().fn_type(&parameters, false),
        })
    }

    /// Creates an internal, zero-initialized global holding a value of `ty`.
    fn create_slot(&mut self, storage: &str, ty: &Type) -> Result<(), Error> {
        let slot = self.create_global(storage, self.convert_type(ty)?);
        self.named_storage
            .insert(storage.to_string(), Storage::Slot(slot));

        Ok(())
    }

    /// Creates the pointer cell of a by-reference formal of type `ty`.
    fn create_cell(&mut self, storage: &str, ty: &Type) -> Result<(), Error> {
        let handle_type = self.convert_type(ty)?.ptr_type(AddressSpace::default());
        let cell = self.create_global(storage, handle_type.into());
        self.named_storage
            .insert(storage.to_string(), Storage::Reference(cell));

        Ok(())
    }

    fn create_global(&self, name: &str, ty: BasicTypeEnum<'a>) -> PointerValue<'a> {
        let global = self.module.add_global(ty, None, name);
        global.set_linkage(Linkage::Internal);
        global.set_initializer(&ty.const_zero());

        global.as_pointer_value()
    }

    pub fn storage(&self, name: &str) -> Result<Storage<'a>, Error> {
        self.named_storage.get(name).copied().ok_or_else(|| {
            Error::codegen(format!("no storage for `{}`", name), Position::null())
        })
    }

    /// The function currently being lowered.
    pub fn current(&self) -> Result<&FunctionContext<'a>, Error> {
        self.functions
            .last()
            .ok_or_else(|| Error::codegen("no function is being lowered", Position::null()))
    }

    /// Returns the block of `label` in the current function, creating it on
    /// first reference.
    pub fn label_block(&mut self, label: &str) -> Result<BasicBlock<'a>, Error> {
        let context = self.context;
        let current = self
            .functions
            .last_mut()
            .ok_or_else(|| Error::codegen("no function is being lowered", Position::null()))?;

        if let Some(block) = current.labels.get(label) {
            return Ok(*block);
        }

        debug!("Creating block for label {}", label);
        let block = context.append_basic_block(current.function, label);
        current.labels.insert(label.to_string(), block);

        Ok(block)
    }

    /// Branches to `target` unless the current block already ends in a terminator.
    pub fn branch_if_open(&self, target: BasicBlock<'a>) -> Result<(), Error> {
        if let Some(block) = self.builder.get_insert_block() {
            if block.get_terminator().is_none() {
                self.builder.build_unconditional_branch(target)?;
            }
        }

        Ok(())
    }

    /// Appends a fresh block to the current function and moves the builder
    /// there. Code after a jump lands in it.
    pub fn open_continuation(&self, name: &str) -> Result<(), Error> {
        let function = self.current()?.function;
        let block = self.context.append_basic_block(function, name);
        self.builder.position_at_end(block);

        Ok(())
    }

    /// Appends a basic block to the current function.
    pub fn append_block(&self, name: &str) -> Result<BasicBlock<'a>, Error> {
        Ok(self
            .context
            .append_basic_block(self.current()?.function, name))
    }

    /// Creates a new function in the module and positions the builder at its
    /// entry block.
    ///
    /// If the function already exists, it reuses the existing declaration.
    pub fn create_function(
        &self,
        name: &str,
        function_type: FunctionType<'a>,
        linkage: Option<Linkage>,
    ) -> FunctionValue<'a> {
        let function = match self.module.get_function(name) {
            Some(function) => function,
            None => self.module.add_function(name, function_type, linkage),
        };

        let entry = self.create_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        function
    }

    /// Creates a function prototype without a body.
    pub fn create_function_proto(
        &self,
        name: &str,
        function_type: FunctionType<'a>,
    ) -> FunctionValue<'a> {
        let function = self.module.add_function(name, function_type, None);

        let nounwind = self
            .context
            .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0);
        function.add_attribute(AttributeLoc::Function, nounwind);

        function
    }

    /// Creates a new basic block in the specified function.
    pub fn create_basic_block(&self, function: FunctionValue<'a>, name: &str) -> BasicBlock<'a> {
        self.context.append_basic_block(function, name)
    }
}

/// Compiles a type-checked program into an LLVM module.
///
/// The module is named after the program, carries the host triple and data
/// layout, is verified and then optimized at the requested level.
pub fn compile<'a>(
    program: &TypedProgram,
    context: &'a Context,
    optimization: u32,
) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, &program.name, optimization);

    compiler.initialize_target()?;
    compiler.gen(program)?;

    compiler
        .module
        .verify()
        .map_err(|error| Error::codegen(error.to_string(), program.span.start.clone()))?;

    compiler.run_passes();

    Ok(compiler)
}
