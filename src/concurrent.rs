//! Lock strategies for the maps in this crate, using only the standard library
//!
//! A map is parameterized by a [`LockMode`]. [`Unsafe`] keeps its store in a
//! `RefCell`, so "locking" is a borrow-flag check and the map is `!Sync`.
//! [`Safe`] keeps its store behind an `RwLock`.

use std::cell::{Ref, RefCell, RefMut};
use std::ops::{Deref, DerefMut};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::warn;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Unsafe {}
    impl Sealed for super::Safe {}
}

/// How a map guards its internal store.
///
/// Implemented by [`Unsafe`] and [`Safe`] only.
pub trait LockMode: sealed::Sealed + Sized + 'static {
    /// Whether access goes through a real reader/writer lock.
    const SAFE: bool;

    /// The other mode.
    type Inverse: LockMode;

    type Cell<T>;
    type ReadGuard<'a, T: 'a>: Deref<Target = T>;
    type WriteGuard<'a, T: 'a>: DerefMut<Target = T>;

    fn wrap<T>(value: T) -> Self::Cell<T>;

    /// Shared access. Blocks while a writer holds a `Safe` cell.
    fn read<'a, T: 'a>(cell: &'a Self::Cell<T>) -> Self::ReadGuard<'a, T>;

    /// Exclusive access. Blocks while anyone else holds a `Safe` cell.
    fn write<'a, T: 'a>(cell: &'a Self::Cell<T>) -> Self::WriteGuard<'a, T>;

    fn into_inner<T>(cell: Self::Cell<T>) -> T;

    /// The store itself for `Unsafe`, a copy taken under the read lock for `Safe`.
    fn view<'a, T: Clone + 'a>(cell: &'a Self::Cell<T>) -> View<'a, T>;
}

/// No locking. The caller owns synchronization; the compiler enforces it since
/// maps in this mode are not `Sync`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unsafe;

/// A single reader/writer lock around the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Safe;

impl LockMode for Unsafe {
    const SAFE: bool = false;

    type Inverse = Safe;

    type Cell<T> = RefCell<T>;
    type ReadGuard<'a, T: 'a> = Ref<'a, T>;
    type WriteGuard<'a, T: 'a> = RefMut<'a, T>;

    fn wrap<T>(value: T) -> RefCell<T> {
        RefCell::new(value)
    }

    fn read<'a, T: 'a>(cell: &'a RefCell<T>) -> Ref<'a, T> {
        cell.borrow()
    }

    fn write<'a, T: 'a>(cell: &'a RefCell<T>) -> RefMut<'a, T> {
        cell.borrow_mut()
    }

    fn into_inner<T>(cell: RefCell<T>) -> T {
        cell.into_inner()
    }

    fn view<'a, T: Clone + 'a>(cell: &'a RefCell<T>) -> View<'a, T> {
        View::Live(cell.borrow())
    }
}

impl LockMode for Safe {
    const SAFE: bool = true;

    type Inverse = Unsafe;

    type Cell<T> = RwLock<T>;
    type ReadGuard<'a, T: 'a> = RwLockReadGuard<'a, T>;
    type WriteGuard<'a, T: 'a> = RwLockWriteGuard<'a, T>;

    fn wrap<T>(value: T) -> RwLock<T> {
        RwLock::new(value)
    }

    fn read<'a, T: 'a>(cell: &'a RwLock<T>) -> RwLockReadGuard<'a, T> {
        cell.read().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned map lock for reading");
            poisoned.into_inner()
        })
    }

    fn write<'a, T: 'a>(cell: &'a RwLock<T>) -> RwLockWriteGuard<'a, T> {
        cell.write().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned map lock for writing");
            poisoned.into_inner()
        })
    }

    fn into_inner<T>(cell: RwLock<T>) -> T {
        cell.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn view<'a, T: Clone + 'a>(cell: &'a RwLock<T>) -> View<'a, T> {
        View::Copied(Self::read(cell).clone())
    }
}

/// Result of [`LockMode::view`].
///
/// A `Live` view borrows the store: any write to the same map while it is
/// alive panics. A `Copied` view is detached from the map.
pub enum View<'a, T> {
    Live(Ref<'a, T>),
    Copied(T),
}

impl<T> View<'_, T> {
    pub fn is_live(&self) -> bool {
        matches!(self, View::Live(_))
    }
}

impl<T: Clone> View<'_, T> {
    /// Detach the view, copying a live borrow.
    pub fn into_owned(self) -> T {
        match self {
            View::Live(data) => data.clone(),
            View::Copied(data) => data,
        }
    }
}

impl<T> Deref for View<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            View::Live(data) => data,
            View::Copied(data) => data,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for View<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&**self, f)
    }
}
