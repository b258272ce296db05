// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock, RwLock};
use bson::oid::ObjectId;
use bson::{Bson, Document, RawDocumentBuf};
use hashbrown::HashMap;
use log::trace;
use crate::serializers::{
    BooleanSerializer,
    BsonSerializer,
    BsonValueSerializer,
    DocumentSerializer,
    DoubleSerializer,
    Int32Serializer,
    Int64Serializer,
    MaxKeySerializer,
    MinKeySerializer,
    ObjectIdSerializer,
    RawDocumentSerializer,
    StringSerializer,
};
use crate::{Error, MaxKey, MinKey, Result};

// The published value is always an `Arc<dyn BsonSerializer<T>>` for the `TypeId` of `T`.
type Instance = Arc<dyn Any + Send + Sync>;
type Provider = Box<dyn Fn() -> Instance + Send + Sync>;

/// Maps a declared type to its shared serializer.
///
/// Lookup is by exact type, there is no fallback to a related type.
/// Instances are created on first lookup and published once, every later
/// lookup of the same type returns the same `Arc`.
pub struct SerializerRegistry {
    providers: RwLock<HashMap<TypeId, Provider>>,
    instances: RwLock<HashMap<TypeId, Instance>>,
}

static GLOBAL_REGISTRY: OnceLock<Arc<SerializerRegistry>> = OnceLock::new();

impl SerializerRegistry {

    pub fn new() -> SerializerRegistry {
        SerializerRegistry::from_providers(HashMap::new())
    }

    /// A registry that knows every built-in serializer.
    pub fn with_defaults() -> SerializerRegistry {
        let mut providers = HashMap::new();
        insert_provider::<MinKey, _>(&mut providers, || Arc::new(MinKeySerializer));
        insert_provider::<MaxKey, _>(&mut providers, || Arc::new(MaxKeySerializer));
        insert_provider::<f64, _>(&mut providers, || Arc::new(DoubleSerializer));
        insert_provider::<i32, _>(&mut providers, || Arc::new(Int32Serializer));
        insert_provider::<i64, _>(&mut providers, || Arc::new(Int64Serializer));
        insert_provider::<bool, _>(&mut providers, || Arc::new(BooleanSerializer));
        insert_provider::<String, _>(&mut providers, || Arc::new(StringSerializer));
        insert_provider::<ObjectId, _>(&mut providers, || Arc::new(ObjectIdSerializer));
        insert_provider::<Bson, _>(&mut providers, || Arc::new(BsonValueSerializer));
        insert_provider::<Document, _>(&mut providers, || Arc::new(DocumentSerializer));
        insert_provider::<RawDocumentBuf, _>(&mut providers, || Arc::new(RawDocumentSerializer));
        SerializerRegistry::from_providers(providers)
    }

    /// The process wide registry, created with [SerializerRegistry::with_defaults].
    pub fn global() -> Arc<SerializerRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(SerializerRegistry::with_defaults()))
            .clone()
    }

    fn from_providers(providers: HashMap<TypeId, Provider>) -> SerializerRegistry {
        SerializerRegistry {
            providers: RwLock::new(providers),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a lazy provider for `T`.
    ///
    /// The provider runs under the registry lock and must not look up
    /// other serializers from this registry.
    pub fn register<T, F>(&self, provider: F) -> Result<()>
    where
        T: 'static,
        F: Fn() -> Arc<dyn BsonSerializer<T>> + Send + Sync + 'static,
    {
        let mut providers = self.providers.write().map_err(|_| Error::LockError)?;
        if providers.contains_key(&TypeId::of::<T>()) {
            return Err(Error::SerializerAlreadyRegistered(type_name::<T>()));
        }
        insert_provider::<T, F>(&mut providers, provider);
        Ok(())
    }

    pub fn is_registered<T: 'static>(&self) -> Result<bool> {
        let providers = self.providers.read().map_err(|_| Error::LockError)?;
        Ok(providers.contains_key(&TypeId::of::<T>()))
    }

    pub fn lookup<T: 'static>(&self) -> Result<Arc<dyn BsonSerializer<T>>> {
        let id = TypeId::of::<T>();
        {
            let instances = self.instances.read().map_err(|_| Error::LockError)?;
            if let Some(instance) = instances.get(&id) {
                return downcast_instance::<T>(instance);
            }
        }

        let mut instances = self.instances.write().map_err(|_| Error::LockError)?;
        // another thread may have published while we waited for the write lock
        if let Some(instance) = instances.get(&id) {
            return downcast_instance::<T>(instance);
        }

        let providers = self.providers.read().map_err(|_| Error::LockError)?;
        let provider = providers
            .get(&id)
            .ok_or(Error::SerializerNotFound(type_name::<T>()))?;
        let instance = provider();
        trace!("serializer published for '{}'", type_name::<T>());
        instances.insert(id, instance.clone());

        downcast_instance::<T>(&instance)
    }

}

impl Default for SerializerRegistry {

    fn default() -> Self {
        SerializerRegistry::with_defaults()
    }

}

fn insert_provider<T, F>(providers: &mut HashMap<TypeId, Provider>, provider: F)
where
    T: 'static,
    F: Fn() -> Arc<dyn BsonSerializer<T>> + Send + Sync + 'static,
{
    let erased: Provider = Box::new(move || -> Instance { Arc::new(provider()) });
    providers.insert(TypeId::of::<T>(), erased);
}

fn downcast_instance<T: 'static>(instance: &Instance) -> Result<Arc<dyn BsonSerializer<T>>> {
    instance
        .as_ref()
        .downcast_ref::<Arc<dyn BsonSerializer<T>>>()
        .cloned()
        .ok_or(Error::SerializerNotFound(type_name::<T>()))
}
