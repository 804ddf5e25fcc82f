/// Generates a BACnet protocol enumeration whose wire value may be any value of
/// the underlying integer type.
///
/// Named variants map to their standard code. Codes without a name are kept,
/// never rejected: a code inside the optional `proprietary` range becomes
/// `Proprietary(..)`, anything else becomes `Reserved(..)`. Both wrap a
/// `<Name>Code` newtype that can only be built by the `From` conversion, so a
/// standard code always decodes to its named variant and conversion back to
/// the integer is lossless.
///
/// # Example
///
/// ```rust
/// use bacnet_codec::bacnet_enum;
///
/// bacnet_enum! {
///     /// Example enumeration
///     Fruit: u16 {
///         Apple = 0,
///         Pear = 1,
///     }
///     proprietary 128..=1023
/// }
///
/// assert_eq!(Fruit::from(1u16), Fruit::Pear);
/// assert!(matches!(Fruit::from(200u16), Fruit::Proprietary(code) if code.value() == 200));
/// assert!(matches!(Fruit::from(2000u16), Fruit::Reserved(_)));
/// assert_eq!(u16::from(Fruit::from(2000u16)), 2000);
/// assert_eq!(Fruit::Apple.to_string(), "Apple");
/// ```
///
/// Without a `proprietary` clause every unnamed code is `Reserved`.
#[macro_export]
macro_rules! bacnet_enum {
    (@define
        $(#[$doc:meta])* $name:ident, $unit:ident,
        { $($(#[$vdoc:meta])* $variant:ident = $value:literal,)+ },
        $range:expr
    ) => {
        $crate::__pastey::paste! {
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            pub enum $name {
                $($(#[$vdoc])* $variant,)+
                /// Code inside the vendor-proprietary range
                Proprietary([<$name Code>]),
                /// Code reserved by ASHRAE for future use
                Reserved([<$name Code>]),
            }

            #[doc = "Non-standard `" $name "` code"]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            pub struct [<$name Code>]($unit);

            impl [<$name Code>] {
                /// Raw wire value
                pub fn value(&self) -> $unit {
                    self.0
                }
            }

            impl $name {
                /// Every named variant, in declaration order
                pub const STANDARD: &'static [$name] = &[$($name::$variant,)+];

                /// True for codes without a standard name
                pub fn is_standard(&self) -> bool {
                    !matches!(self, $name::Proprietary(_) | $name::Reserved(_))
                }
            }

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $($name::$variant => f.write_str(stringify!($variant)),)+
                        $name::Proprietary(code) => write!(f, "Proprietary({})", code.value()),
                        $name::Reserved(code) => write!(f, "Reserved({})", code.value()),
                    }
                }
            }

            impl From<$name> for $unit {
                fn from(value: $name) -> Self {
                    match value {
                        $($name::$variant => $value,)+
                        $name::Proprietary(code) | $name::Reserved(code) => code.value(),
                    }
                }
            }

            impl From<$unit> for $name {
                fn from(value: $unit) -> Self {
                    match value {
                        $($value => $name::$variant,)+
                        other => {
                            let proprietary: Option<core::ops::RangeInclusive<$unit>> = $range;
                            match proprietary {
                                Some(range) if range.contains(&other) => {
                                    $name::Proprietary([<$name Code>](other))
                                }
                                _ => $name::Reserved([<$name Code>](other)),
                            }
                        }
                    }
                }
            }
        }
    };
    (
        $(#[$doc:meta])*
        $name:ident: $unit:ident {
            $($(#[$vdoc:meta])* $variant:ident = $value:literal,)+
        }
        proprietary $range:expr
    ) => {
        $crate::bacnet_enum!(@define $(#[$doc])* $name, $unit, { $($(#[$vdoc])* $variant = $value,)+ }, Some($range));
    };
    (
        $(#[$doc:meta])*
        $name:ident: $unit:ident {
            $($(#[$vdoc:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $crate::bacnet_enum!(@define $(#[$doc])* $name, $unit, { $($(#[$vdoc])* $variant = $value,)+ }, None::<core::ops::RangeInclusive<$unit>>);
    };
}
