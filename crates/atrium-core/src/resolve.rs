//! Code-reference resolution.
//!
//! Pure with respect to its inputs aside from the unresolved-reference
//! callback: given the manifest's extension declarations and the loaded
//! module, produce the resolved extensions. Individual resolution failures
//! degrade gracefully — the property is dropped and the callback is told —
//! rather than failing the whole plugin.

use std::collections::HashMap;

use tracing::debug;

use crate::extension::{ExtensionDeclaration, ResolvedExtension, ResolvedProperty, encoded_code_ref};
use crate::module::PluginModule;
use crate::plugin::PluginId;

/// Resolves encoded code references against a loaded module.
///
/// Injected into the entry callback handler so tests can substitute it.
pub trait CodeRefResolver: Send + Sync {
    /// Resolve every code reference in `extensions` against `module`.
    ///
    /// `on_unresolved` is invoked once per reference that the module does
    /// not export; the property is then omitted from the result.
    fn resolve(
        &self,
        extensions: &[ExtensionDeclaration],
        module: &dyn PluginModule,
        plugin_id: &PluginId,
        on_unresolved: &dyn Fn(&str),
    ) -> Vec<ResolvedExtension>;
}

/// Default resolver: looks each reference up via [`PluginModule::export`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCodeRefResolver;

impl CodeRefResolver for DefaultCodeRefResolver {
    fn resolve(
        &self,
        extensions: &[ExtensionDeclaration],
        module: &dyn PluginModule,
        plugin_id: &PluginId,
        on_unresolved: &dyn Fn(&str),
    ) -> Vec<ResolvedExtension> {
        extensions
            .iter()
            .map(|declaration| {
                let mut properties = HashMap::with_capacity(declaration.properties.len());
                for (key, value) in &declaration.properties {
                    match encoded_code_ref(value) {
                        Some(reference) => match module.export(reference) {
                            Some(handle) => {
                                debug!(
                                    plugin_id = %plugin_id,
                                    kind = %declaration.kind,
                                    reference,
                                    "Resolved code reference"
                                );
                                properties.insert(key.clone(), ResolvedProperty::Code(handle));
                            },
                            None => on_unresolved(reference),
                        },
                        None => {
                            properties.insert(key.clone(), ResolvedProperty::Value(value.clone()));
                        },
                    }
                }
                ResolvedExtension {
                    kind: declaration.kind.clone(),
                    properties,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ExportHandle;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct MapModule(HashMap<String, ExportHandle>);

    impl PluginModule for MapModule {
        fn export(&self, name: &str) -> Option<ExportHandle> {
            self.0.get(name).cloned()
        }
    }

    fn declarations() -> Vec<ExtensionDeclaration> {
        vec![
            ExtensionDeclaration {
                kind: "console.nav/item".into(),
                properties: json!({
                    "label": "Demo",
                    "component": { "$codeRef": "NavItem" }
                })
                .as_object()
                .unwrap()
                .clone(),
            },
            ExtensionDeclaration {
                kind: "console.page/route".into(),
                properties: json!({
                    "path": "/demo",
                    "component": { "$codeRef": "Missing" }
                })
                .as_object()
                .unwrap()
                .clone(),
            },
        ]
    }

    #[test]
    fn test_resolution_mixes_values_and_code() {
        let module = MapModule(HashMap::from([(
            "NavItem".to_string(),
            Arc::new(7_u32) as ExportHandle,
        )]));
        let plugin_id: PluginId = "demo@1.0.0".parse().unwrap();
        let unresolved = Mutex::new(Vec::new());

        let resolved = DefaultCodeRefResolver.resolve(
            &declarations(),
            &module,
            &plugin_id,
            &|reference| unresolved.lock().unwrap().push(reference.to_string()),
        );

        assert_eq!(resolved.len(), 2);
        assert!(resolved[0].properties["label"].as_value().is_some());
        assert!(resolved[0].properties["component"].as_code().is_some());

        // The unresolvable reference is dropped, not fatal.
        assert!(!resolved[1].properties.contains_key("component"));
        assert!(resolved[1].properties.contains_key("path"));
        assert_eq!(*unresolved.lock().unwrap(), vec!["Missing".to_string()]);
    }

    #[test]
    fn test_resolution_without_refs_is_pass_through() {
        let module = MapModule(HashMap::new());
        let plugin_id: PluginId = "demo@1.0.0".parse().unwrap();
        let declarations = vec![ExtensionDeclaration {
            kind: "console.flag".into(),
            properties: json!({ "flag": "DEMO", "default": true })
                .as_object()
                .unwrap()
                .clone(),
        }];

        let resolved =
            DefaultCodeRefResolver.resolve(&declarations, &module, &plugin_id, &|_| {
                panic!("no reference should be unresolved")
            });

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].properties.len(), 2);
    }
}
