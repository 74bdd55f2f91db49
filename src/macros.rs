//! Setter generators for request builders.
//!
//! Every setter takes `self` by value and returns the updated request, so
//! requests are built in one expression and handed to a namespace.

/// `fn field(self, value: T)` for `Option<T>` fields
macro_rules! setters {
    ($ty:ty { $($field:ident: $arg:ty),* $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self, value: $arg) -> Self {
                    self.$field = Some(value);
                    self
                }
            )*
        }
    };
}

/// `fn field(self, value: impl Into<String>)` for `Option<String>` fields
macro_rules! string_setters {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self, value: impl Into<String>) -> Self {
                    self.$field = Some(value.into());
                    self
                }
            )*
        }
    };
}

/// `fn field(self)` switching a `bool` field on
macro_rules! flags {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self) -> Self {
                    self.$field = true;
                    self
                }
            )*
        }
    };
}

/// `fn field(self, value: Vec<T>)` for plain `Vec<T>` fields
macro_rules! list_setters {
    ($ty:ty { $($field:ident: $item:ty),* $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self, value: Vec<$item>) -> Self {
                    self.$field = value;
                    self
                }
            )*
        }
    };
}
