use core::fmt::{Debug, Display, Formatter, Result};

/// Searches all ancestor directories of the current working directory
/// (including itself) for a file or directory with the given name.
/// If found, returns the path to the file or directory.
pub fn search_current_ancestor_dirs_for(name: &str) -> Option<std::path::PathBuf> {
    [
        std::env::current_dir().as_ref(),
        std::env::current_exe().as_ref(),
    ]
    .iter()
    .filter_map(|p| p.ok())
    .flat_map(|p| p.ancestors())
    .find(|p| {
        p.read_dir().is_ok_and(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_str().is_some_and(|n| n.starts_with(name)))
        })
    })
    .map(|p| p.join(name))
}

/// A wrapper that formats the items of a slice joined by a separator.
///
/// Used wherever a list of numbers becomes part of a file name or a tool argument,
/// e.g., `1-2-2-4` or `1,2,2,4`.
pub struct Separated<'a, T> {
    items: &'a [T],
    separator: &'static str,
}

macro_rules! fmt_impl {
    ($self:expr, $f:expr, $format:literal) => {
        let mut iter = $self.items.iter();
        if let Some(first) = iter.next() {
            write!($f, $format, first)?;
            for item in iter {
                write!($f, "{}", $self.separator)?;
                write!($f, $format, item)?;
            }
        }
    };
}

impl<T: Display> Display for Separated<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        fmt_impl!(self, f, "{}");
        Ok(())
    }
}

impl<T: Debug> Debug for Separated<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        fmt_impl!(self, f, "{:?}");
        Ok(())
    }
}

pub fn separated<'a, T>(items: &'a [T], separator: &'static str) -> Separated<'a, T> {
    Separated { items, separator }
}

pub fn comma_separated<T>(items: &[T]) -> Separated<'_, T> {
    separated(items, ",")
}

pub fn dash_separated<T>(items: &[T]) -> Separated<'_, T> {
    separated(items, "-")
}
