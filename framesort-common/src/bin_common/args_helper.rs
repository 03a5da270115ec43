/// Declares a group of command line arguments that can also be used as a plain
/// configuration struct by library code.
///
/// Leaf fields are written as `"help" name: Type = default;` and nested groups as
/// `name: Group;`, the latter are flattened into the parent on the command line. Every
/// field gets a builder style setter with the same name.
#[macro_export]
macro_rules! args {
    ($(#$argsmeta:tt)* $name:ident {
        $($fhelp:literal $fname:ident: $ftype:ty = $fdefault:expr;)*
        $($gname:ident: $gtype:ty;)*
    }) => {
        #[derive(clap::Args, Debug)]
        $(#$argsmeta)*
        pub struct $name {
            $(
                #[arg(long, default_value_t = ($fdefault), help = $fhelp)]
                pub $fname: $ftype,
            )*

            $(
                #[command(flatten)]
                pub $gname: $gtype,
            )*
        }

        impl std::default::Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $fname: $fdefault,
                    )*

                    $(
                        $gname: <$gtype as std::default::Default>::default(),
                    )*
                }
            }
        }

        impl $name {
            $(
                pub fn $fname(mut self, $fname: $ftype) -> Self {
                    self.$fname = $fname;
                    self
                }
            )*

            $(
                pub fn $gname(mut self, $gname: $gtype) -> Self {
                    self.$gname = $gname;
                    self
                }
            )*
        }
    };
}

pub use args;
