use std::slice;

use super::Payload;

/// Аргументы одного вызова `emit`/`gather` для динамической шины.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Payload>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(&self) -> Option<&Payload> {
        self.0.first()
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Payload> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Payload> {
        self.0.iter()
    }

    pub fn push(
        &mut self,
        value: impl Into<Payload>,
    ) {
        self.0.push(value.into());
    }

    /// Значение, которым разрешается promise: первый аргумент или `Null`,
    /// если аргументов не было.
    pub fn into_value(self) -> Payload {
        self.0.into_iter().next().unwrap_or_default()
    }

    pub fn into_vec(self) -> Vec<Payload> {
        self.0
    }
}

impl From<Vec<Payload>> for Args {
    fn from(values: Vec<Payload>) -> Self {
        Self(values)
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

macro_rules! impl_args_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Payload>),+> From<($($name,)+)> for Args {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Self(vec![$($name.into()),+])
            }
        }
    };
}

impl_args_from_tuple!(T1);
impl_args_from_tuple!(T1, T2);
impl_args_from_tuple!(T1, T2, T3);
impl_args_from_tuple!(T1, T2, T3, T4);

impl IntoIterator for Args {
    type Item = Payload;
    type IntoIter = std::vec::IntoIter<Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Payload;
    type IntoIter = slice::Iter<'a, Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Собирает [`Args`] из значений, приводимых к [`Payload`].
///
/// ```ignore
/// bus.emit("test pass arguments", args!["🐱", "🐶"]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from(vec![$($crate::Payload::from($value)),+])
    };
}
