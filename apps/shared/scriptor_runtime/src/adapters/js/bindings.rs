//! JavaScript bindings for the scripting bridge
//!
//! Entity proxies are exposed as instances of the `Entity` class ([`EntityJs`]).
//! Graph nodes are never handed to scripts: every call goes through the
//! wrapped [`EntityProxy`], so mutations are recorded as commands.
//!
//! # JavaScript Glue Code
//!
//! `glue/init.js` is embedded at compile time and evaluated before each
//! script. It builds `console.*` and `exit()` on top of the native
//! `__scriptor_native` object installed by [`setup_native_api`].

use rquickjs::{
    class::Trace,
    convert::Coerced,
    function::{Opt, Rest},
    Array, Ctx, Exception, Function, IntoJs, JsLifetime, Object, Value,
};

use crate::api::ConsoleApi;
use crate::dom::{AttrValue, EntityProxy};
use crate::engine::Binding;
use crate::error::DomError;
use crate::model::Property;

/// JavaScript glue code, embedded from `glue/init.js`
pub const JS_GLUE_CODE: &str = include_str!("glue/init.js");

/// Global holding the native functions used by the glue
pub const NATIVE_GLOBAL: &str = "__scriptor_native";

/// Global holding the name of the script being evaluated
pub const SCRIPT_GLOBAL: &str = "__SCRIPT__";

/// Property marking the value thrown by `exit()`
pub const EXIT_MARKER: &str = "__scriptor_exit__";

/// True when `exception` is the value thrown by `exit()`
pub fn is_exit_signal(exception: &Value<'_>) -> bool {
    exception
        .as_object()
        .and_then(|o| o.get::<_, Option<bool>>(EXIT_MARKER).ok().flatten())
        .unwrap_or(false)
}

fn throw<T>(ctx: &Ctx<'_>, result: Result<T, DomError>) -> rquickjs::Result<T> {
    result.map_err(|e| Exception::throw_message(ctx, &e.to_string()))
}

/// Read an optional text argument; `null` and `undefined` read as absent
fn text_arg(value: Opt<Value<'_>>) -> rquickjs::Result<Option<String>> {
    match value.0 {
        None => Ok(None),
        Some(v) if v.is_undefined() || v.is_null() => Ok(None),
        Some(v) => Ok(Some(v.get::<Coerced<String>>()?.0)),
    }
}

/// Read a property list: an array of `{key, value}` objects or `[key, value]`
/// pairs. Entries with an absent key or value are skipped.
fn properties_arg<'js>(list: Array<'js>) -> rquickjs::Result<Vec<Property>> {
    let mut properties = Vec::with_capacity(list.len());
    for item in list.iter::<Value>() {
        let item = item?;
        let (key, value) = if let Some(pair) = item.as_array() {
            (pair.get::<Option<String>>(0)?, pair.get::<Option<String>>(1)?)
        } else if let Some(object) = item.as_object() {
            (object.get::<_, Option<String>>("key")?, object.get::<_, Option<String>>("value")?)
        } else {
            (None, None)
        };
        if let (Some(key), Some(value)) = (key, value) {
            properties.push(Property::new(key, value));
        }
    }
    Ok(properties)
}

fn property_object<'js>(ctx: &Ctx<'js>, property: &Property) -> rquickjs::Result<Object<'js>> {
    let object = Object::new(ctx.clone())?;
    object.set("key", property.key.as_str())?;
    object.set("value", property.value.as_str())?;
    Ok(object)
}

fn json_arg<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> rquickjs::Result<serde_json::Value> {
    let Some(text) = ctx.json_stringify(value)? else {
        return Ok(serde_json::Value::Null);
    };
    Ok(serde_json::from_str(&text.to_string()?).unwrap_or(serde_json::Value::Null))
}

fn wrap_all(proxies: Vec<EntityProxy>) -> Vec<EntityJs> {
    proxies.into_iter().map(EntityJs::new).collect()
}

/// JavaScript view of an entity proxy
///
/// This class is exposed to JavaScript as `Entity`. Scripts receive instances
/// through DOM-root globals such as `model` and by navigating from them.
#[rquickjs::class(rename = "Entity")]
#[derive(Clone, Trace, JsLifetime)]
pub struct EntityJs {
    #[qjs(skip_trace)]
    proxy: EntityProxy,
}

impl EntityJs {
    pub fn new(proxy: EntityProxy) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &EntityProxy {
        &self.proxy
    }
}

#[rquickjs::methods]
impl EntityJs {
    #[qjs(get)]
    pub fn id(&self) -> Option<String> {
        self.proxy.id()
    }

    #[qjs(get, rename = "type")]
    pub fn type_name(&self) -> Option<String> {
        self.proxy.type_name()
    }

    #[qjs(get)]
    pub fn name(&self) -> Option<String> {
        self.proxy.name()
    }

    #[qjs(set, rename = "name")]
    pub fn set_name<'js>(&mut self, ctx: Ctx<'js>, value: Opt<Value<'js>>) -> rquickjs::Result<()> {
        if let Some(name) = text_arg(value)? {
            throw(&ctx, self.proxy.set_name(&name).map(|_| ()))?;
        }
        Ok(())
    }

    #[qjs(get)]
    pub fn documentation(&self) -> Option<String> {
        self.proxy.documentation()
    }

    #[qjs(set, rename = "documentation")]
    pub fn set_documentation<'js>(&mut self, ctx: Ctx<'js>, value: Opt<Value<'js>>) -> rquickjs::Result<()> {
        if let Some(documentation) = text_arg(value)? {
            throw(&ctx, self.proxy.set_documentation(&documentation).map(|_| ()))?;
        }
        Ok(())
    }

    #[qjs(rename = "isBound")]
    pub fn is_bound(&self) -> bool {
        self.proxy.is_bound()
    }

    /// Children, optionally filtered by a selector
    ///
    /// ```javascript
    /// model.children("folder");
    /// folder.children("business-actor");
    /// ```
    pub fn children<'js>(&self, selector: Opt<Value<'js>>) -> rquickjs::Result<Vec<EntityJs>> {
        Ok(match text_arg(selector)? {
            Some(selector) => wrap_all(self.proxy.children_matching(&selector)),
            None => wrap_all(self.proxy.children()),
        })
    }

    pub fn parent(&self) -> Option<EntityJs> {
        self.proxy.parent().map(EntityJs::new)
    }

    pub fn model(&self) -> Option<EntityJs> {
        self.proxy.model().map(EntityJs::new)
    }

    /// Distinct property keys in first-occurrence order
    #[qjs(rename = "getPropertyKey")]
    pub fn get_property_key(&self) -> Vec<String> {
        self.proxy.get_property_keys()
    }

    /// Every value stored under `key`
    #[qjs(rename = "getPropertyValue")]
    pub fn get_property_value<'js>(&self, key: Opt<Value<'js>>) -> rquickjs::Result<Vec<String>> {
        Ok(text_arg(key)?
            .map(|key| self.proxy.get_property_values(&key))
            .unwrap_or_default())
    }

    #[qjs(rename = "getPropertyKeys")]
    pub fn get_property_keys(&self) -> Vec<String> {
        self.get_property_key()
    }

    #[qjs(rename = "getPropertyValues")]
    pub fn get_property_values<'js>(&self, key: Opt<Value<'js>>) -> rquickjs::Result<Vec<String>> {
        self.get_property_value(key)
    }

    /// Properties as an array of `{key, value}` objects
    #[qjs(rename = "getProperties")]
    pub fn get_properties<'js>(&self, ctx: Ctx<'js>) -> rquickjs::Result<Vec<Object<'js>>> {
        self.proxy
            .get_properties()
            .iter()
            .map(|p| property_object(&ctx, p))
            .collect()
    }

    #[qjs(rename = "setProperties")]
    pub fn set_properties<'js>(&self, ctx: Ctx<'js>, list: Array<'js>) -> rquickjs::Result<EntityJs> {
        let properties = properties_arg(list)?;
        throw(&ctx, self.proxy.set_properties(&properties))?;
        Ok(self.clone())
    }

    #[qjs(rename = "addProperty")]
    pub fn add_property<'js>(&self, ctx: Ctx<'js>, key: Opt<Value<'js>>, value: Opt<Value<'js>>) -> rquickjs::Result<EntityJs> {
        if let (Some(key), Some(value)) = (text_arg(key)?, text_arg(value)?) {
            throw(&ctx, self.proxy.add_property(&key, &value))?;
        }
        Ok(self.clone())
    }

    #[qjs(rename = "addOrUpdateProperty")]
    pub fn add_or_update_property<'js>(
        &self,
        ctx: Ctx<'js>,
        key: Opt<Value<'js>>,
        value: Opt<Value<'js>>,
    ) -> rquickjs::Result<EntityJs> {
        if let (Some(key), Some(value)) = (text_arg(key)?, text_arg(value)?) {
            throw(&ctx, self.proxy.add_or_update_property(&key, &value))?;
        }
        Ok(self.clone())
    }

    #[qjs(rename = "updateProperty")]
    pub fn update_property<'js>(&self, ctx: Ctx<'js>, key: Opt<Value<'js>>, value: Opt<Value<'js>>) -> rquickjs::Result<EntityJs> {
        if let (Some(key), Some(value)) = (text_arg(key)?, text_arg(value)?) {
            throw(&ctx, self.proxy.update_property(&key, &value))?;
        }
        Ok(self.clone())
    }

    /// Remove every property with `key`, or only those also matching `value`
    #[qjs(rename = "removeProperty")]
    pub fn remove_property<'js>(&self, ctx: Ctx<'js>, key: Opt<Value<'js>>, value: Opt<Value<'js>>) -> rquickjs::Result<EntityJs> {
        if let Some(key) = text_arg(key)? {
            let value = text_arg(value)?;
            throw(&ctx, self.proxy.remove_property(&key, value.as_deref()))?;
        }
        Ok(self.clone())
    }

    /// Call a method by name; only `delete` does anything
    pub fn invoke<'js>(&self, ctx: Ctx<'js>, method: String, args: Rest<Value<'js>>) -> rquickjs::Result<EntityJs> {
        let args = args
            .0
            .into_iter()
            .map(|v| json_arg(&ctx, v))
            .collect::<rquickjs::Result<Vec<_>>>()?;
        throw(&ctx, self.proxy.invoke(&method, &args))?;
        Ok(self.clone())
    }

    /// Read an attribute, or write it when a value is given
    ///
    /// ```javascript
    /// element.attr("name");           // read
    /// element.attr("name", "Teller"); // write, returns the entity
    /// ```
    pub fn attr<'js>(&self, ctx: Ctx<'js>, name: String, value: Opt<Value<'js>>) -> rquickjs::Result<Value<'js>> {
        if value.0.is_some() {
            if let Some(value) = text_arg(value)? {
                throw(&ctx, self.proxy.set_attr(&name, &value))?;
            }
            return self.clone().into_js(&ctx);
        }
        match self.proxy.attr(&name) {
            Some(AttrValue::Text(text)) => text.into_js(&ctx),
            Some(AttrValue::Children(children)) => wrap_all(children).into_js(&ctx),
            None => Ok(Value::new_undefined(ctx)),
        }
    }

    #[qjs(rename = "isDeletable")]
    pub fn is_deletable(&self) -> bool {
        self.proxy.is_deletable()
    }

    pub fn delete<'js>(&self, ctx: Ctx<'js>) -> rquickjs::Result<()> {
        throw(&ctx, self.proxy.delete())
    }

    pub fn relationship(&self) -> Option<EntityJs> {
        self.proxy.relationship().map(EntityJs::new)
    }

    #[qjs(rename = "setRelationship")]
    pub fn set_relationship<'js>(&self, ctx: Ctx<'js>, relationship: EntityJs) -> rquickjs::Result<EntityJs> {
        throw(&ctx, self.proxy.set_relationship(&relationship.proxy))?;
        Ok(self.clone())
    }

    pub fn source(&self) -> Option<EntityJs> {
        self.proxy.source().map(EntityJs::new)
    }

    pub fn target(&self) -> Option<EntityJs> {
        self.proxy.target().map(EntityJs::new)
    }

    pub fn concept(&self) -> Option<EntityJs> {
        self.proxy.concept().map(EntityJs::new)
    }

    /// Same bound node; unbound entities are never equal
    pub fn equals<'js>(&self, other: Value<'js>) -> bool {
        other
            .as_object()
            .and_then(|o| o.as_class::<EntityJs>())
            .is_some_and(|other| self.proxy == other.borrow().proxy)
    }

    #[qjs(rename = "toString")]
    pub fn to_js_string(&self) -> String {
        self.proxy.to_string()
    }
}

/// Convert a run binding into a JavaScript value
pub fn binding_to_js<'js>(ctx: &Ctx<'js>, binding: &Binding) -> rquickjs::Result<Value<'js>> {
    match binding {
        Binding::Text(text) => text.as_str().into_js(ctx),
        Binding::Entity(proxy) => EntityJs::new(proxy.clone()).into_js(ctx),
        Binding::Data(data) => ctx.json_parse(data.to_string()),
        Binding::Host(handle) => {
            let object = Object::new(ctx.clone())?;
            object.set("kind", handle.kind.as_str())?;
            object.set("label", handle.label.as_str())?;
            Ok(object.into_value())
        }
    }
}

/// Install the `Entity` class and the native functions used by the glue
///
/// # Arguments
/// * `ctx` - The JavaScript context
pub fn setup_native_api(ctx: Ctx) -> Result<(), rquickjs::Error> {
    rquickjs::Class::<EntityJs>::define(&ctx.globals())?;

    let native = Object::new(ctx.clone())?;

    // Pre-formatted console line at a given level
    let log_fn = Function::new(ctx.clone(), |ctx: Ctx, level: String, message: String| {
        let script: String = ctx
            .globals()
            .get(SCRIPT_GLOBAL)
            .unwrap_or_else(|_| "unknown".to_string());
        ConsoleApi::by_level(&level, "js", &script, &message);
    })?;
    native.set("log", log_fn)?;

    // Sanctioned termination: unwind the script with a marked value
    let exit_fn = Function::new(ctx.clone(), |ctx: Ctx| -> rquickjs::Result<()> {
        let signal = Object::new(ctx.clone())?;
        signal.set("name", "ExitSignal")?;
        signal.set("message", "exit")?;
        signal.set(EXIT_MARKER, true)?;
        Err(ctx.throw(signal.into_value()))
    })?;
    native.set("exit", exit_fn)?;

    ctx.globals().set(NATIVE_GLOBAL, native)?;
    Ok(())
}
