//! Security domains
//!
//! A [`SecurityDomain`] is one isolated VM: two global namespaces (system
//! and application), the table of loaded modules and an optional catalog of
//! lazily loaded system modules.

use bytecode_system::{AbcCatalog, AbcFile, Constant, DefinitionKind};
use core_types::{ErrorKind, FunctionRef, IndentingWriter, Value, VmError};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Instant;

use crate::host::Host;
use crate::natives;

/// Deepest allowed nesting of bytecode calls
pub const MAX_CALL_DEPTH: usize = 256;

/// The two namespaces of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainScope {
    /// Trusted infrastructure: builtins, shell library, catalog modules
    System,
    /// User programs
    Application,
}

impl DomainScope {
    /// Lowercase name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            DomainScope::System => "system",
            DomainScope::Application => "application",
        }
    }
}

/// Index of a module in its domain's module table
pub type ModuleId = usize;

/// Global namespace of one scope
#[derive(Debug, Default, Clone)]
pub struct ApplicationDomain {
    globals: HashMap<String, Value>,
    modules: Vec<ModuleId>,
}

impl ApplicationDomain {
    /// Look up a global
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Define or overwrite a global
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Whether `name` is defined
    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Defined names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Modules loaded into this scope, in load order
    pub fn modules(&self) -> &[ModuleId] {
        &self.modules
    }
}

#[derive(Debug)]
struct LoadedModule {
    abc: Rc<AbcFile>,
    scope: DomainScope,
}

/// Execution settings of a domain
#[derive(Debug, Clone)]
pub struct DomainOptions {
    /// Diagnostics writer
    pub writer: IndentingWriter,
    /// Skip the verifier when loading modules
    pub release: bool,
    /// Trace module loads and catalog resolution
    pub trace_runtime: bool,
    /// Trace every executed instruction
    pub trace_interpreter: bool,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            writer: IndentingWriter::stdout(),
            release: false,
            trace_runtime: false,
            trace_interpreter: false,
        }
    }
}

impl DomainOptions {
    /// Options writing to `writer`
    pub fn with_writer(mut self, writer: IndentingWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Enable or disable release mode
    pub fn with_release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Select the trace channels
    pub fn with_tracing(mut self, runtime: bool, interpreter: bool) -> Self {
        self.trace_runtime = runtime;
        self.trace_interpreter = interpreter;
        self
    }
}

/// An isolated VM execution context.
///
/// # Example
///
/// ```
/// use bytecode_system::assemble;
/// use core_types::{IndentingWriter, Value};
/// use interpreter::{DomainOptions, DomainScope, SecurityDomain, WriterHost};
/// use std::rc::Rc;
///
/// let (writer, buffer) = IndentingWriter::captured();
/// let mut domain = SecurityDomain::new(DomainOptions::default().with_writer(writer.clone()));
/// domain.initialize();
///
/// let abc = assemble(
///     ".method main\n  getglobal trace\n  pushstring \"hi\"\n  call 1\n  returnvalue\n.end\n.init main",
///     "hi.abc",
/// )
/// .unwrap();
/// let mut host = WriterHost::new(writer);
/// let result = domain.execute_abc(DomainScope::Application, Rc::new(abc), &mut host).unwrap();
///
/// assert_eq!(result, Value::Undefined);
/// assert_eq!(buffer.contents(), "hi\n");
/// ```
#[derive(Debug)]
pub struct SecurityDomain {
    system: ApplicationDomain,
    application: ApplicationDomain,
    modules: Vec<LoadedModule>,
    catalog: Option<AbcCatalog>,
    catalog_loaded: HashSet<usize>,
    catalog_failed: HashMap<usize, VmError>,
    initialized: bool,
    options: DomainOptions,
    started: Instant,
}

impl SecurityDomain {
    /// Create an empty, uninitialized domain
    pub fn new(options: DomainOptions) -> Self {
        Self {
            system: ApplicationDomain::default(),
            application: ApplicationDomain::default(),
            modules: Vec::new(),
            catalog: None,
            catalog_loaded: HashSet::new(),
            catalog_failed: HashMap::new(),
            initialized: false,
            options,
            started: Instant::now(),
        }
    }

    /// Execution settings
    pub fn options(&self) -> &DomainOptions {
        &self.options
    }

    /// Diagnostics writer
    pub fn writer(&self) -> &IndentingWriter {
        &self.options.writer
    }

    /// Namespace of `scope`
    pub fn scope(&self, scope: DomainScope) -> &ApplicationDomain {
        match scope {
            DomainScope::System => &self.system,
            DomainScope::Application => &self.application,
        }
    }

    fn scope_mut(&mut self, scope: DomainScope) -> &mut ApplicationDomain {
        match scope {
            DomainScope::System => &mut self.system,
            DomainScope::Application => &mut self.application,
        }
    }

    /// Attach a global-symbol catalog.
    ///
    /// # Errors
    ///
    /// The catalog must be attached before [`SecurityDomain::initialize`].
    pub fn set_catalog(&mut self, catalog: AbcCatalog) -> Result<(), VmError> {
        if self.initialized {
            return Err(VmError::new(
                ErrorKind::InternalError,
                "catalog must be attached before initialization",
            ));
        }
        self.catalog = Some(catalog);
        Ok(())
    }

    /// The attached catalog, if any
    pub fn catalog(&self) -> Option<&AbcCatalog> {
        self.catalog.as_ref()
    }

    /// Install the native intrinsics into the system scope.
    ///
    /// Calling this again has no effect.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        for name in natives::NAMES {
            self.system.set(*name, Value::NativeFunction(name.to_string()));
        }
        self.initialized = true;
    }

    /// Whether [`SecurityDomain::initialize`] has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Milliseconds since the domain was created
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Number of modules loaded across both scopes
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Module `id`
    pub fn module(&self, id: ModuleId) -> Option<&Rc<AbcFile>> {
        self.modules.get(id).map(|m| &m.abc)
    }

    /// Scope module `id` was loaded into
    pub fn module_scope(&self, id: ModuleId) -> Option<DomainScope> {
        self.modules.get(id).map(|m| m.scope)
    }

    /// Labels of the modules loaded into `scope`
    pub fn module_labels(&self, scope: DomainScope) -> Vec<&str> {
        self.scope(scope)
            .modules
            .iter()
            .filter_map(|id| self.modules.get(*id))
            .map(|m| m.abc.label())
            .collect()
    }

    /// Register a module and bind its top-level definitions into `scope`.
    ///
    /// Outside release mode the module is verified first.
    ///
    /// # Errors
    ///
    /// Returns a `VerifyError` when verification fails.
    pub fn load_abc(&mut self, scope: DomainScope, abc: Rc<AbcFile>) -> Result<ModuleId, VmError> {
        if !self.options.release {
            abc.verify()
                .map_err(|e| VmError::new(ErrorKind::VerifyError, e.to_string()))?;
        }
        let id = self.modules.len();
        if self.options.trace_runtime {
            self.options.writer.write_ln(&format!(
                "Loading {} into {} scope as module #{}",
                abc.label(),
                scope.name(),
                id
            ));
        }

        let mut bindings = Vec::with_capacity(abc.definitions().len());
        for definition in abc.definitions() {
            let name = abc
                .string_constant(definition.name)
                .map_err(|e| VmError::new(ErrorKind::InternalError, e.to_string()))?;
            let value = match definition.kind {
                DefinitionKind::Slot(None) => Value::Undefined,
                DefinitionKind::Slot(Some(index)) => match abc.constant(index) {
                    Ok(Constant::Int(n)) => Value::Int(*n),
                    Ok(Constant::Double(n)) => Value::Double(*n),
                    Ok(Constant::String(s)) => Value::String(s.clone()),
                    Err(e) => return Err(VmError::new(ErrorKind::InternalError, e.to_string())),
                },
                DefinitionKind::Method(method) => {
                    Value::Function(FunctionRef { module: id, method })
                }
            };
            bindings.push((name.to_string(), value));
        }

        let namespace = self.scope_mut(scope);
        for (name, value) in bindings {
            namespace.set(name, value);
        }
        namespace.modules.push(id);
        self.modules.push(LoadedModule { abc, scope });
        Ok(id)
    }

    /// Run the initializer of a loaded module.
    ///
    /// # Errors
    ///
    /// Fails if the domain is not initialized or the initializer throws.
    pub fn execute_module(&mut self, id: ModuleId, host: &mut dyn Host) -> Result<Value, VmError> {
        if !self.initialized {
            return Err(VmError::new(
                ErrorKind::InternalError,
                "security domain is not initialized",
            ));
        }
        let abc = self
            .module(id)
            .cloned()
            .ok_or_else(|| VmError::new(ErrorKind::InternalError, format!("no module #{}", id)))?;
        let init = FunctionRef {
            module: id,
            method: abc.init_method(),
        };
        self.call_function(init, &[], host, 0)
    }

    /// Load `abc` into `scope` and run its initializer
    pub fn execute_abc(
        &mut self,
        scope: DomainScope,
        abc: Rc<AbcFile>,
        host: &mut dyn Host,
    ) -> Result<Value, VmError> {
        if !self.initialized {
            return Err(VmError::new(
                ErrorKind::InternalError,
                "security domain is not initialized",
            ));
        }
        let id = self.load_abc(scope, abc)?;
        self.execute_module(id, host)
    }

    /// Call a function value with `args`
    pub fn invoke(
        &mut self,
        function: &Value,
        args: &[Value],
        host: &mut dyn Host,
    ) -> Result<Value, VmError> {
        self.call_value(function, args, host, 0)
    }

    /// Look up a global visible to `scope`, without consulting the catalog
    pub fn get_global(&self, scope: DomainScope, name: &str) -> Option<&Value> {
        match scope {
            DomainScope::Application => {
                self.application.get(name).or_else(|| self.system.get(name))
            }
            DomainScope::System => self.system.get(name),
        }
    }

    /// Define a global in `scope`
    pub fn set_global(&mut self, scope: DomainScope, name: impl Into<String>, value: Value) {
        self.scope_mut(scope).set(name, value);
    }

    /// Resolve a global as bytecode sees it.
    ///
    /// Order: the caller's own scope, the system scope, then the catalog,
    /// whose defining module is loaded into the system scope and executed.
    ///
    /// # Errors
    ///
    /// Returns a `ReferenceError` when the name resolves nowhere.
    pub fn resolve_global(
        &mut self,
        scope: DomainScope,
        name: &str,
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<Value, VmError> {
        if let Some(value) = self.get_global(scope, name) {
            return Ok(value.clone());
        }

        let entry = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.entry_for_symbol(name));
        if let Some(entry) = entry {
            if let Some(error) = self.catalog_failed.get(&entry) {
                return Err(error.clone());
            }
            if !self.catalog_loaded.contains(&entry) {
                self.load_catalog_entry(entry, name, host, depth)?;
                if let Some(value) = self.get_global(scope, name) {
                    return Ok(value.clone());
                }
            }
        }

        Err(VmError::new(
            ErrorKind::ReferenceError,
            format!("{} is not defined", name),
        ))
    }

    /// Load and initialize catalog entry `entry` into the system scope.
    ///
    /// The entry counts as loaded while its initializer runs, so lookups
    /// from inside it do not recurse. A failure is kept and returned for
    /// every later lookup of the entry's symbols.
    fn load_catalog_entry(
        &mut self,
        entry: usize,
        symbol: &str,
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<(), VmError> {
        self.catalog_loaded.insert(entry);
        let result = self.run_catalog_entry(entry, symbol, host, depth);
        if let Err(error) = &result {
            self.catalog_loaded.remove(&entry);
            self.catalog_failed.insert(entry, error.clone());
        }
        result
    }

    fn run_catalog_entry(
        &mut self,
        entry: usize,
        symbol: &str,
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<(), VmError> {
        let abc = match self.catalog.as_ref() {
            Some(catalog) => catalog
                .load_entry(entry)
                .map_err(|e| VmError::new(ErrorKind::InternalError, e.to_string()))?,
            None => return Ok(()),
        };
        if self.options.trace_runtime {
            self.options.writer.write_ln(&format!(
                "Catalog: resolving {} from {}",
                symbol,
                abc.label()
            ));
        }
        let id = self.load_abc(DomainScope::System, Rc::new(abc))?;
        let init = self.modules[id].abc.init_method();
        self.call_function(FunctionRef { module: id, method: init }, &[], host, depth)?;
        Ok(())
    }

    pub(crate) fn loaded(&self, id: ModuleId) -> Result<(Rc<AbcFile>, DomainScope), VmError> {
        self.modules
            .get(id)
            .map(|m| (Rc::clone(&m.abc), m.scope))
            .ok_or_else(|| VmError::new(ErrorKind::InternalError, format!("no module #{}", id)))
    }

    /// Name of the method behind a function value, for diagnostics
    pub fn function_name(&self, function: &Value) -> String {
        match function {
            Value::Function(f) => self
                .module(f.module)
                .map(|abc| abc.method_name(f.method).to_string())
                .unwrap_or_default(),
            Value::NativeFunction(name) => name.clone(),
            other => other.to_string(),
        }
    }
}
