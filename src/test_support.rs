/// Declare a bare module type for tests.
macro_rules! test_module {
    (
        $ty:ident, $name:expr, parent: $parent:expr
        $(, hook: $hook:expr)?
        $(, prefix: $prefix:expr)?
    ) => {
        pub struct $ty {
            args: $crate::module::ModuleArgs,
        }

        impl $crate::module::Module for $ty {
            fn args(&self) -> &$crate::module::ModuleArgs {
                &self.args
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::module::ModuleType for $ty {
            const NAME: &'static str = $name;
            const PACKAGE: &'static str = "modargs.tests";
            $(const CONFIG_PREFIX: Option<&'static str> = Some($prefix);)?

            fn parent() -> Option<$crate::module::ModuleClass> {
                $parent
            }
            $(
                fn arguments() -> Option<$crate::module::ArgumentsHook> {
                    Some($hook)
                }
            )?
            fn from_args(args: $crate::module::ModuleArgs) -> $crate::errors::Result<Self> {
                Ok(Self { args })
            }
        }
    };
}
