//! Built-in numeric functions

pub mod math;

use ahash::AHashMap;
use once_cell::sync::Lazy;

/// Function implementation signature.
///
/// The compiler checks arity against the [`FunctionDef`] before binding, so
/// implementations may index `args` directly up to their declared minimum.
/// All implementations are total over f64: out-of-domain inputs follow IEEE
/// conventions (NaN/infinity) rather than erroring.
pub type FunctionImpl = fn(&[f64]) -> f64;

/// Function definition
pub struct FunctionDef {
    /// Function name
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// True if a call with `n` arguments is within the declared arity
    pub fn arity_ok(&self, n: usize) -> bool {
        n >= self.min_args && self.max_args.map_or(true, |max| n <= max)
    }

    /// Human-readable expected argument count, for error messages
    pub fn expected_args(&self) -> String {
        match (self.min_args, self.max_args) {
            (min, Some(max)) if min == max => format!("{min}"),
            (min, Some(max)) => format!("{min} to {max}"),
            (min, None) => format!("at least {min}"),
        }
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions.
    ///
    /// Names are case-sensitive and lowercase, like variable names.
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_unary_math();
        registry.register_binary_math();
        registry.register_constants();

        registry
    }

    /// Create a registry with no functions at all
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function, replacing any previous definition of the name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_string(), def);
    }

    fn register_unary_math(&mut self) {
        for (name, implementation) in [
            ("sqrt", math::fn_sqrt as FunctionImpl),
            ("abs", math::fn_abs),
            ("sin", math::fn_sin),
            ("cos", math::fn_cos),
            ("tan", math::fn_tan),
            ("asin", math::fn_asin),
            ("acos", math::fn_acos),
            ("atan", math::fn_atan),
            ("exp", math::fn_exp),
            ("ln", math::fn_ln),
            ("log10", math::fn_log10),
            ("floor", math::fn_floor),
            ("ceil", math::fn_ceil),
            ("round", math::fn_round),
            ("sign", math::fn_sign),
        ] {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: Some(1),
                implementation,
            });
        }

        // log(x) is base 10; log(x, base) overrides
        self.register(FunctionDef {
            name: "log",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_log,
        });
    }

    fn register_binary_math(&mut self) {
        self.register(FunctionDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: math::fn_min,
        });

        self.register(FunctionDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: math::fn_max,
        });

        self.register(FunctionDef {
            name: "pow",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_pow,
        });

        self.register(FunctionDef {
            name: "atan2",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_atan2,
        });

        self.register(FunctionDef {
            name: "mod",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_mod,
        });
    }

    fn register_constants(&mut self) {
        self.register(FunctionDef {
            name: "pi",
            min_args: 0,
            max_args: Some(0),
            implementation: math::fn_pi,
        });

        self.register(FunctionDef {
            name: "e",
            min_args: 0,
            max_args: Some(0),
            implementation: math::fn_e,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide table of built-in functions
static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The shared built-in function registry
pub fn builtins() -> &'static FunctionRegistry {
    &BUILTINS
}
