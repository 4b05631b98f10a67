//! # Signal Bus
//!
//! Typed publish/subscribe between components that hold no references to
//! each other.
//!
//! ```text
//!  ┌───────────┐  emit(&A)  ┌────────────┐   slot(&A)   ┌───────────┐
//!  │ producer  │───────────>│ Signal<A>  │─────────────>│ consumers │
//!  └───────────┘            └────────────┘  in connect  └───────────┘
//!                                              order
//! ```
//!
//! Slots may connect and disconnect (themselves included) while being
//! emitted to: `emit` works from a snapshot of the slot table and skips any
//! slot that was disconnected after the snapshot was taken.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Slot<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct SlotTable<A> {
    next_id: u64,
    slots: BTreeMap<u64, Slot<A>>,
}

type Shared<A> = Arc<Mutex<SlotTable<A>>>;

/// Identifier of one connected slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

/// A typed signal carrying `&A` to every connected slot.
///
/// Clones are handles to the same slot table.
///
/// # Example
///
/// ```rust
/// use tessera_runtime::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let damage = Signal::<i32>::new();
/// let total = Arc::new(AtomicI32::new(0));
///
/// let sink = Arc::clone(&total);
/// let _conn = damage.connect(move |amount| {
///     sink.fetch_add(*amount, Ordering::SeqCst);
/// });
///
/// damage.emit(&7);
/// damage.emit(&3);
/// assert_eq!(total.load(Ordering::SeqCst), 10);
/// ```
pub struct Signal<A: 'static> {
    shared: Shared<A>,
}

impl<A: 'static> Signal<A> {
    /// Creates a signal with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SlotTable {
                next_id: 0,
                slots: BTreeMap::new(),
            })),
        }
    }

    /// Connects `slot`; it runs on every subsequent `emit`.
    pub fn connect<F>(&self, slot: F) -> Connection<A>
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let mut table = self.shared.lock();
        table.next_id += 1;
        let id = table.next_id;
        table.slots.insert(id, Arc::new(slot));

        Connection {
            signal: Arc::downgrade(&self.shared),
            id: ConnectionId(id),
        }
    }

    /// Connects `method` on a weakly held `target`.
    ///
    /// Once `target` has been dropped the slot does nothing; it stays
    /// connected until disconnected explicitly.
    pub fn connect_weak<T>(&self, target: Weak<T>, method: fn(&T, &A)) -> Connection<A>
    where
        T: Send + Sync + 'static,
    {
        self.connect(move |args| {
            if let Some(target) = target.upgrade() {
                method(&target, args);
            }
        })
    }

    /// Calls every connected slot with `args`, in connection order.
    ///
    /// Returns the number of slots called.
    pub fn emit(&self, args: &A) -> usize {
        let snapshot: Vec<(u64, Slot<A>)> = self
            .shared
            .lock()
            .slots
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut called = 0;
        for (id, slot) in snapshot {
            let live = self.shared.lock().slots.contains_key(&id);
            if live {
                slot(args);
                called += 1;
            }
        }
        called
    }

    /// Disconnects the slot `id`. Returns `true` if it was connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.shared.lock().slots.remove(&id.0).is_some()
    }

    /// Disconnects every slot.
    pub fn disconnect_all(&self) {
        self.shared.lock().slots.clear();
    }

    /// Checks whether the slot `id` is connected.
    #[must_use]
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.shared.lock().slots.contains_key(&id.0)
    }

    /// Number of connected slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.shared.lock().slots.len()
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slot_count())
            .finish()
    }
}

/// Handle to one connected slot.
///
/// Dropping a `Connection` leaves the slot connected; use
/// [`ScopedConnection`] for disconnect-on-drop.
pub struct Connection<A: 'static> {
    signal: Weak<Mutex<SlotTable<A>>>,
    id: ConnectionId,
}

impl<A: 'static> Connection<A> {
    /// ID of the slot.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while the signal is alive and still holds the slot.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.signal
            .upgrade()
            .is_some_and(|shared| shared.lock().slots.contains_key(&self.id.0))
    }

    /// Disconnects the slot and detaches this handle from the signal.
    pub fn disconnect(&mut self) {
        if let Some(shared) = self.signal.upgrade() {
            shared.lock().slots.remove(&self.id.0);
        }
        self.signal = Weak::new();
    }
}

impl<A: 'static> Default for Connection<A> {
    /// A handle attached to no signal.
    fn default() -> Self {
        Self {
            signal: Weak::new(),
            id: ConnectionId(0),
        }
    }
}

impl<A: 'static> Clone for Connection<A> {
    fn clone(&self) -> Self {
        Self {
            signal: Weak::clone(&self.signal),
            id: self.id,
        }
    }
}

impl<A: 'static> fmt::Debug for Connection<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.connected())
            .finish()
    }
}

/// Connection that disconnects its slot when dropped.
pub struct ScopedConnection<A: 'static> {
    connection: Connection<A>,
}

impl<A: 'static> ScopedConnection<A> {
    /// Takes over `connection`.
    #[must_use]
    pub fn new(connection: Connection<A>) -> Self {
        Self { connection }
    }

    /// Returns `true` while the slot is connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connection.connected()
    }

    /// Disconnects the slot now.
    pub fn reset(&mut self) {
        self.connection.disconnect();
    }

    /// Gives up ownership without disconnecting.
    #[must_use]
    pub fn release(mut self) -> Connection<A> {
        std::mem::take(&mut self.connection)
    }
}

impl<A: 'static> From<Connection<A>> for ScopedConnection<A> {
    fn from(connection: Connection<A>) -> Self {
        Self::new(connection)
    }
}

impl<A: 'static> Drop for ScopedConnection<A> {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}

impl<A: 'static> fmt::Debug for ScopedConnection<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopedConnection")
            .field(&self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;
    use std::thread;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Signal<String>) {
        (Arc::new(Mutex::new(Vec::new())), Signal::new())
    }

    #[test]
    fn test_emit_in_connection_order() {
        let (log, signal) = recorder();
        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            let _ = signal.connect(move |msg: &String| log.lock().push(format!("{tag}:{msg}")));
        }

        assert_eq!(signal.emit(&"x".to_owned()), 3);
        assert_eq!(*log.lock(), vec!["a:x", "b:x", "c:x"]);
    }

    #[test]
    fn test_connection_disconnect() {
        let signal = Signal::<u32>::new();
        let mut conn = signal.connect(|_| {});
        assert!(conn.connected());
        assert_eq!(signal.slot_count(), 1);

        conn.disconnect();
        assert!(!conn.connected());
        assert_eq!(signal.slot_count(), 0);
        assert_eq!(signal.emit(&1), 0);
    }

    #[test]
    fn test_slot_can_disconnect_itself_mid_emit() {
        let signal = Signal::<()>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(OnceLock::new());

        let handle = signal.clone();
        let counter = Arc::clone(&calls);
        let id_cell = Arc::clone(&own_id);
        let conn = signal.connect(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = id_cell.get() {
                handle.disconnect(*id);
            }
        });
        own_id.set(conn.id()).unwrap();

        signal.emit(&());
        signal.emit(&());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!conn.connected());
    }

    #[test]
    fn test_slot_disconnected_mid_emit_is_skipped() {
        let (log, signal) = recorder();
        let victim = Arc::new(OnceLock::new());

        let handle = signal.clone();
        let target = Arc::clone(&victim);
        let _ = signal.connect(move |_| {
            if let Some(id) = target.get() {
                handle.disconnect(*id);
            }
        });
        let sink = Arc::clone(&log);
        let later = signal.connect(move |msg| sink.lock().push(msg.clone()));
        victim.set(later.id()).unwrap();

        assert_eq!(signal.emit(&"lost".to_owned()), 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_slot_connected_mid_emit_runs_next_time() {
        let signal = Signal::<()>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = signal.clone();
        let counter = Arc::clone(&calls);
        let _ = signal.connect(move |()| {
            let counter = Arc::clone(&counter);
            let _ = handle.connect(move |()| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(signal.emit(&()), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(signal.emit(&()), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_connection_disconnects_on_drop() {
        let signal = Signal::<i32>::new();
        {
            let scoped = ScopedConnection::new(signal.connect(|_| {}));
            assert!(scoped.connected());
            assert_eq!(signal.slot_count(), 1);
        }
        assert_eq!(signal.slot_count(), 0);
    }

    #[test]
    fn test_scoped_release_keeps_slot() {
        let signal = Signal::<i32>::new();
        let scoped: ScopedConnection<i32> = signal.connect(|_| {}).into();
        let conn = scoped.release();

        assert!(conn.connected());
        assert_eq!(signal.slot_count(), 1);
    }

    #[test]
    fn test_scoped_reset() {
        let signal = Signal::<i32>::new();
        let mut scoped = ScopedConnection::new(signal.connect(|_| {}));
        scoped.reset();
        assert!(!scoped.connected());
        assert_eq!(signal.slot_count(), 0);
    }

    #[test]
    fn test_connect_weak_skips_dropped_target() {
        struct Listener {
            hits: AtomicUsize,
        }
        impl Listener {
            fn on_event(&self, _: &u8) {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
        }

        let signal = Signal::<u8>::new();
        let listener = Arc::new(Listener { hits: AtomicUsize::new(0) });
        let conn = signal.connect_weak(Arc::downgrade(&listener), Listener::on_event);

        signal.emit(&1);
        assert_eq!(listener.hits.load(Ordering::SeqCst), 1);

        drop(listener);
        signal.emit(&2);
        assert!(conn.connected());
    }

    #[test]
    fn test_connection_outliving_signal() {
        let signal = Signal::<u8>::new();
        let mut conn = signal.connect(|_| {});
        drop(signal);

        assert!(!conn.connected());
        conn.disconnect();
        assert!(!Connection::<u8>::default().connected());
    }

    #[test]
    fn test_emit_from_another_thread() {
        let signal = Signal::<usize>::new();
        let total = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&total);
        let _conn = signal.connect(move |n| {
            sink.fetch_add(*n, Ordering::SeqCst);
        });

        let remote = signal.clone();
        thread::spawn(move || {
            for n in 1..=4 {
                remote.emit(&n);
            }
        })
        .join()
        .unwrap();

        assert_eq!(total.load(Ordering::SeqCst), 10);
    }
}
