//! Reference-counted object store
//!
//! Design: a slot heap behind a `parking_lot::Mutex`. `Handle` is the only way
//! to hold an object from outside the heap:
//! - Clone increments the count, Drop decrements it
//! - A count reaching zero frees the slot and releases its children
//! - No handle is created or dropped while the heap lock is held

use super::object::{ClassDef, ObjId, Object};
use crate::errors::{MarshalError, Result};
use crate::interop::{require_sequence, ObjectSystem, Primitive};
use crate::logging::trace;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

struct Slot {
    object: Object,
    refcount: u32,
}

#[derive(Default)]
struct Heap {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    modules: HashMap<String, ObjId>,
}

impl Heap {
    fn alloc(&mut self, object: Object) -> ObjId {
        let slot = Some(Slot { object, refcount: 1 });
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = slot;
                ObjId(index)
            }
            None => {
                self.slots.push(slot);
                ObjId(self.slots.len() as u32 - 1)
            }
        };
        trace!(event = "object_alloc", id = id.0);
        id
    }

    fn slot(&self, id: ObjId) -> Result<&Slot> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| MarshalError::host(format!("dangling object id {}", id.0)))
    }

    fn slot_mut(&mut self, id: ObjId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| MarshalError::host(format!("dangling object id {}", id.0)))
    }

    fn object(&self, id: ObjId) -> Result<&Object> {
        self.slot(id).map(|slot| &slot.object)
    }

    fn retain(&mut self, id: ObjId) {
        if let Ok(slot) = self.slot_mut(id) {
            slot.refcount += 1;
        }
    }

    /// Drop one reference, freeing everything that becomes unreachable
    fn release(&mut self, id: ObjId) {
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            let Ok(slot) = self.slot_mut(id) else {
                debug_assert!(false, "release of dangling object {}", id.0);
                continue;
            };

            slot.refcount -= 1;
            if slot.refcount > 0 {
                continue;
            }

            if let Some(freed) = self.slots[id.index()].take() {
                trace!(event = "object_free", id = id.0, kind = freed.object.type_name());
                pending.extend(freed.object.children());
                self.free.push(id.0);
            }
        }
    }

    fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Managed object store with Python-like objects
#[derive(Default)]
pub struct ObjectStore {
    heap: Mutex<Heap>,
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("live_objects", &self.live_objects())
            .finish()
    }
}

/// Owned reference to a store object
pub struct Handle<'s> {
    store: &'s ObjectStore,
    id: ObjId,
}

impl<'s> Handle<'s> {
    /// Wrap an id whose reference the caller already owns
    fn adopt(store: &'s ObjectStore, id: ObjId) -> Self {
        Self { store, id }
    }

    #[inline]
    pub fn id(&self) -> ObjId {
        self.id
    }

    #[inline]
    pub fn store(&self) -> &'s ObjectStore {
        self.store
    }

    /// Give up the handle, transferring its reference to the caller
    fn into_id(self) -> ObjId {
        let id = self.id;
        std::mem::forget(self);
        id
    }
}

impl Clone for Handle<'_> {
    fn clone(&self) -> Self {
        self.store.heap.lock().retain(self.id);
        Self { store: self.store, id: self.id }
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        self.store.heap.lock().release(self.id);
    }
}

impl std::fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.id.0)
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self, object: Object) -> Handle<'_> {
        let id = self.heap.lock().alloc(object);
        Handle::adopt(self, id)
    }

    pub fn none(&self) -> Handle<'_> {
        self.alloc(Object::None)
    }

    pub fn bool(&self, value: bool) -> Handle<'_> {
        self.alloc(Object::Bool(value))
    }

    pub fn int(&self, value: i64) -> Handle<'_> {
        self.alloc(Object::Int(value))
    }

    /// Integer outside the `i64` range
    pub fn big_int(&self, value: i128) -> Handle<'_> {
        match i64::try_from(value) {
            Ok(small) => self.int(small),
            Err(_) => self.alloc(Object::BigInt(value)),
        }
    }

    pub fn float(&self, value: f64) -> Handle<'_> {
        self.alloc(Object::Float(value))
    }

    pub fn text(&self, bytes: &[u8]) -> Handle<'_> {
        self.alloc(Object::Str(bytes.to_vec()))
    }

    /// New list owning `items`
    pub fn list<'s>(&'s self, items: Vec<Handle<'s>>) -> Handle<'s> {
        let ids = items.into_iter().map(Handle::into_id).collect();
        self.alloc(Object::List(ids))
    }

    pub fn class(&self, def: ClassDef) -> Handle<'_> {
        self.alloc(Object::Class(def))
    }

    /// Register a module under `name`, replacing any previous one
    pub fn install_module<'s>(&'s self, name: &str, attrs: Vec<(String, Handle<'s>)>) {
        let attrs: BTreeMap<String, ObjId> = attrs
            .into_iter()
            .map(|(key, value)| (key, value.into_id()))
            .collect();

        let mut heap = self.heap.lock();
        let id = heap.alloc(Object::Module { name: name.to_string(), attrs });
        if let Some(previous) = heap.modules.insert(name.to_string(), id) {
            heap.release(previous);
        }
    }

    /// Look up an installed module
    pub fn import_module(&self, name: &str) -> Option<Handle<'_>> {
        let mut heap = self.heap.lock();
        let id = *heap.modules.get(name)?;
        heap.retain(id);
        drop(heap);
        Some(Handle::adopt(self, id))
    }

    /// Read an attribute of a module or instance
    pub fn attr<'s>(&'s self, obj: &Handle<'s>, name: &str) -> Result<Option<Handle<'s>>> {
        let mut heap = self.heap.lock();
        let found = heap.object(obj.id)?.attrs().and_then(|attrs| attrs.get(name).copied());
        Ok(found.map(|id| {
            heap.retain(id);
            Handle::adopt(self, id)
        }))
    }

    /// Set an attribute of a module or instance, taking ownership of `value`
    pub fn set_attr<'s>(&'s self, obj: &Handle<'s>, name: &str, value: Handle<'s>) -> Result<()> {
        let mut heap = self.heap.lock();
        let object = &mut heap.slot_mut(obj.id)?.object;
        let kind = object.type_name();

        let Some(attrs) = object.attrs_mut() else {
            return Err(MarshalError::host(format!(
                "'{}' object has no attribute '{}'",
                kind, name
            )));
        };

        if let Some(previous) = attrs.insert(name.to_string(), value.into_id()) {
            heap.release(previous);
        }
        Ok(())
    }

    /// Call a class, producing an initialized instance
    pub fn call<'s>(
        &'s self,
        callable: &Handle<'s>,
        args: &[Handle<'s>],
        kwargs: &[(&str, Handle<'s>)],
    ) -> Result<Handle<'s>> {
        let def = match self.heap.lock().object(callable.id)? {
            Object::Class(def) => def.clone(),
            other => {
                return Err(MarshalError::host(format!(
                    "'{}' object is not callable",
                    other.type_name()
                )))
            }
        };

        if args.len() > def.params.len() {
            return Err(MarshalError::host(format!(
                "{}() takes {} arguments but {} were given",
                def.name,
                def.params.len(),
                args.len()
            )));
        }

        let mut bound: Vec<Option<Handle<'s>>> = vec![None; def.params.len()];
        for (slot, arg) in bound.iter_mut().zip(args) {
            *slot = Some(arg.clone());
        }
        for (key, value) in kwargs {
            let position = def.params.iter().position(|p| p == key).ok_or_else(|| {
                MarshalError::host(format!("{}() got an unexpected keyword argument '{}'", def.name, key))
            })?;
            if bound[position].is_some() {
                return Err(MarshalError::host(format!(
                    "{}() got multiple values for argument '{}'",
                    def.name, key
                )));
            }
            bound[position] = Some(value.clone());
        }

        let class_id = callable.clone().into_id();
        let instance = self.alloc(Object::Instance { class: class_id, attrs: BTreeMap::new() });
        (def.init)(self, &instance, &bound)?;
        Ok(instance)
    }

    /// Primitive view used by the coercion rules
    pub fn primitive(&self, obj: &Handle<'_>) -> Primitive {
        let heap = self.heap.lock();
        match heap.object(obj.id) {
            Ok(Object::None) => Primitive::None,
            Ok(Object::Bool(b)) => Primitive::Bool(*b),
            Ok(Object::Int(v)) => Primitive::Int(*v),
            Ok(Object::BigInt(v)) => Primitive::BigInt(*v),
            Ok(Object::Float(v)) => Primitive::Float(*v),
            Ok(Object::Str(bytes)) => Primitive::Text(bytes.clone()),
            Ok(Object::List(_)) => Primitive::Sequence,
            Ok(Object::Instance { class, .. }) => match heap.object(*class) {
                Ok(Object::Class(def)) => Primitive::Other(def.name.clone()),
                _ => Primitive::Other("object".to_string()),
            },
            Ok(other) => Primitive::Other(other.type_name().to_string()),
            Err(_) => Primitive::Other("<freed>".to_string()),
        }
    }

    /// Length of a list or string
    pub fn length(&self, seq: &Handle<'_>) -> Result<usize> {
        match self.heap.lock().object(seq.id)? {
            Object::List(items) => Ok(items.len()),
            Object::Str(bytes) => Ok(bytes.len()),
            other => Err(MarshalError::host(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    pub fn get_item<'s>(&'s self, seq: &Handle<'s>, index: usize) -> Result<Option<Handle<'s>>> {
        let mut heap = self.heap.lock();
        let id = match heap.object(seq.id)? {
            Object::List(items) => items.get(index).copied(),
            other => {
                return Err(MarshalError::host(format!(
                    "'{}' object is not subscriptable",
                    other.type_name()
                )))
            }
        };
        Ok(id.map(|id| {
            heap.retain(id);
            Handle::adopt(self, id)
        }))
    }

    /// Current reference count of an object
    pub fn refcount(&self, obj: &Handle<'_>) -> u32 {
        self.heap.lock().slot(obj.id).map_or(0, |slot| slot.refcount)
    }

    /// Objects currently allocated, module registry included
    pub fn live_objects(&self) -> usize {
        self.heap.lock().live()
    }

    /// JSON rendering of an object graph
    pub fn to_json(&self, obj: &Handle<'_>) -> Value {
        let heap = self.heap.lock();
        let mut visiting = HashSet::new();
        render(&heap, obj.id, &mut visiting)
    }
}

fn render(heap: &Heap, id: ObjId, visiting: &mut HashSet<ObjId>) -> Value {
    let Ok(object) = heap.object(id) else {
        return Value::Null;
    };
    if !visiting.insert(id) {
        return json!("<cycle>");
    }

    let value = match object {
        Object::None => Value::Null,
        Object::Bool(b) => json!(b),
        Object::Int(v) => json!(v),
        Object::BigInt(v) => json!(v.to_string()),
        Object::Float(v) => json!(v),
        Object::Str(bytes) => json!(String::from_utf8_lossy(bytes)),
        Object::List(items) => Value::Array(items.iter().map(|&item| render(heap, item, visiting)).collect()),
        Object::Module { name, .. } => json!(format!("<module '{}'>", name)),
        Object::Class(def) => json!(format!("<class '{}'>", def.name)),
        Object::Instance { class, attrs } => {
            let mut map = Map::new();
            if let Ok(Object::Class(def)) = heap.object(*class) {
                map.insert("__class__".to_string(), json!(def.name));
            }
            for (key, &value) in attrs {
                map.insert(key.clone(), render(heap, value, visiting));
            }
            Value::Object(map)
        }
    };

    visiting.remove(&id);
    value
}

impl<'s> ObjectSystem for &'s ObjectStore {
    type Ref = Handle<'s>;

    fn import(&self, module: &str) -> Result<Handle<'s>> {
        self.import_module(module)
            .ok_or_else(|| MarshalError::host(format!("No module named '{}'", module)))
    }

    fn get_attr(&self, obj: &Handle<'s>, name: &str) -> Result<Option<Handle<'s>>> {
        self.attr(obj, name)
    }

    fn set_attr(&self, obj: &Handle<'s>, name: &str, value: Handle<'s>) -> Result<()> {
        ObjectStore::set_attr(*self, obj, name, value)
    }

    fn call(
        &self,
        callable: &Handle<'s>,
        args: &[Handle<'s>],
        kwargs: &[(&str, Handle<'s>)],
    ) -> Result<Handle<'s>> {
        ObjectStore::call(*self, callable, args, kwargs)
    }

    fn inspect(&self, obj: &Handle<'s>) -> Primitive {
        self.primitive(obj)
    }

    fn seq_len(&self, seq: &Handle<'s>) -> Result<usize> {
        require_sequence(&self.primitive(seq))?;
        self.length(seq)
    }

    fn item(&self, seq: &Handle<'s>, index: usize) -> Result<Option<Handle<'s>>> {
        self.get_item(seq, index)
    }

    fn new_list(&self, items: Vec<Handle<'s>>) -> Result<Handle<'s>> {
        Ok(self.list(items))
    }

    fn new_int(&self, value: i64) -> Result<Handle<'s>> {
        Ok(self.int(value))
    }

    fn new_float(&self, value: f64) -> Result<Handle<'s>> {
        Ok(self.float(value))
    }

    fn new_bool(&self, value: bool) -> Result<Handle<'s>> {
        Ok(self.bool(value))
    }

    fn new_text(&self, bytes: &[u8]) -> Result<Handle<'s>> {
        Ok(self.text(bytes))
    }
}
