//! Self-service role bindings.
//!
//! Roles are the ownership side of the model: a role binds a change type
//! to the datafiles/resources its members may change, and names the
//! members who approve. The engine looks bindings up by the exact
//! `(file type, path, change type name)` triple.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use bcov_rules::{extract_context, ChangeTypeProcessor};
use bcov_types::{Approver, BundleFileType, User};

use crate::context::ChangeTypeContext;
use crate::matcher::ChangeCoverage;

/// A role as delivered by the role provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name.
    pub name: String,
    /// Path of the role's own datafile.
    pub path: String,
    /// Self-service sections binding change types to owned files.
    #[serde(rename = "selfService", default)]
    pub self_service: Vec<SelfServiceConfig>,
    /// Members of the role; they approve covered changes.
    #[serde(default)]
    pub users: Vec<User>,
    /// Saas files owned by this role, bound implicitly to the
    /// saas-file-owner change type when one is configured.
    #[serde(rename = "ownedSaasFiles", default)]
    pub owned_saas_files: Vec<DatafileObject>,
}

/// One self-service section of a role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfServiceConfig {
    /// The bound change type.
    #[serde(rename = "changeType")]
    pub change_type: ChangeTypeRef,
    /// Datafiles owned under this binding.
    #[serde(default)]
    pub datafiles: Vec<DatafileObject>,
    /// Resourcefile paths owned under this binding.
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Reference to a change type by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeTypeRef {
    pub name: String,
}

/// A datafile owned by a role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatafileObject {
    /// Schema of the owned datafile.
    #[serde(rename = "datafileSchema", default)]
    pub datafile_schema: Option<String>,
    /// Path of the owned datafile.
    pub path: String,
}

/// Index from `(file type, path, change type name)` to the roles bound
/// there. Built locally per evaluation pass; role definitions may change
/// between runs.
type RoleLookup<'a> = HashMap<(BundleFileType, &'a str, &'a str), Vec<&'a Role>>;

fn build_role_lookup<'a>(
    roles: &'a [Role],
    saas_file_owner_change_type: Option<&'a str>,
) -> RoleLookup<'a> {
    let mut lookup: RoleLookup<'a> = HashMap::new();

    for role in roles {
        if let Some(owner_change_type) = saas_file_owner_change_type {
            for saas_file in &role.owned_saas_files {
                lookup
                    .entry((
                        BundleFileType::Datafile,
                        saas_file.path.as_str(),
                        owner_change_type,
                    ))
                    .or_default()
                    .push(role);
            }
        }

        for section in &role.self_service {
            for datafile in &section.datafiles {
                lookup
                    .entry((
                        BundleFileType::Datafile,
                        datafile.path.as_str(),
                        section.change_type.name.as_str(),
                    ))
                    .or_default()
                    .push(role);
            }
            for resource in &section.resources {
                lookup
                    .entry((
                        BundleFileType::Resourcefile,
                        resource.as_str(),
                        section.change_type.name.as_str(),
                    ))
                    .or_default()
                    .push(role);
            }
        }
    }
    lookup
}

/// Cover every change with the contexts arising from self-service roles.
///
/// For each (change, change type) pair the owning entities are extracted;
/// every entity bound to the change type in a role yields one coverage
/// context (`"RoleV1 - {name}"`, the role's users as approvers) which is
/// matched against the change's deltas.
pub fn cover_changes_with_self_service_roles(
    changes: &mut [ChangeCoverage],
    processors: &[Arc<ChangeTypeProcessor>],
    roles: &[Role],
    saas_file_owner_change_type: Option<&str>,
) {
    let lookup = build_role_lookup(roles, saas_file_owner_change_type);

    for change in changes.iter_mut() {
        for processor in processors {
            let owner_refs = extract_context(change.change(), processor);
            for owner_ref in owner_refs {
                let key = (
                    owner_ref.file_type,
                    owner_ref.path.as_str(),
                    processor.name(),
                );
                let Some(bound_roles) = lookup.get(&key) else {
                    continue;
                };
                for role in bound_roles {
                    let approvers: Vec<Arc<dyn Approver>> = role
                        .users
                        .iter()
                        .map(|u| Arc::new(u.clone()) as Arc<dyn Approver>)
                        .collect();
                    let context = Arc::new(ChangeTypeContext::new(
                        Arc::clone(processor),
                        format!("RoleV1 - {}", role.name),
                        approvers,
                    ));
                    let matched = change.cover_changes(&context);
                    tracing::debug!(
                        file = %change.fileref(),
                        change_type = processor.name(),
                        role = %role.name,
                        matched = matched.len(),
                        "applied coverage context"
                    );
                }
            }
        }
    }
}

/// Convenience constructor for a role with a single self-service section.
pub fn build_role(
    name: impl Into<String>,
    change_type_name: impl Into<String>,
    datafiles: Vec<DatafileObject>,
    users: &[&str],
) -> Role {
    let name = name.into();
    Role {
        path: format!("/role/{name}.yaml"),
        name,
        self_service: vec![SelfServiceConfig {
            change_type: ChangeTypeRef {
                name: change_type_name.into(),
            },
            datafiles,
            resources: Vec::new(),
        }],
        users: users.iter().map(|u| User::new(*u)).collect(),
        owned_saas_files: Vec::new(),
    }
}
