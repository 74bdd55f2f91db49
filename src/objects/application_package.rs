use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{quote_part, AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Distribution {
    Internal,
    External,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Internal => "INTERNAL",
            Distribution::External => "EXTERNAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApplicationPackage {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub distribution: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub retention_time: Option<i64>,
    pub options: Option<String>,
    pub dropped_on: Option<DateTime<Utc>>,
    pub application_class: Option<String>,
}

impl FromRow for ApplicationPackage {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(ApplicationPackage {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            distribution: row.opt_string("distribution"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            retention_time: row.opt_int("retention_time"),
            options: row.opt_string("options"),
            dropped_on: row.opt_timestamp("dropped_on"),
            application_class: row.opt_string("application_class"),
        })
    }
}

impl Identifiable for ApplicationPackage {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// A row of `SHOW VERSIONS IN APPLICATION PACKAGE`; one per version and patch.
#[derive(Clone, Debug, PartialEq)]
pub struct ApplicationPackageVersion {
    pub version: String,
    pub patch: i64,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub dropped_on: Option<DateTime<Utc>>,
    pub log_level: Option<String>,
    pub trace_level: Option<String>,
    pub state: Option<String>,
    pub review_status: Option<String>,
}

impl FromRow for ApplicationPackageVersion {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(ApplicationPackageVersion {
            version: row.string("version")?,
            patch: row.int("patch")?,
            label: row.opt_string("label"),
            comment: row.opt_string("comment"),
            created_on: row.opt_timestamp("created_on"),
            dropped_on: row.opt_timestamp("dropped_on"),
            log_level: row.opt_string("log_level"),
            trace_level: row.opt_string("trace_level"),
            state: row.opt_string("state"),
            review_status: row.opt_string("review_status"),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateApplicationPackage {
    id: AccountObjectIdentifier,
    if_not_exists: bool,
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    default_ddl_collation: Option<String>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
    distribution: Option<Distribution>,
}

impl CreateApplicationPackage {
    pub fn new(id: AccountObjectIdentifier) -> CreateApplicationPackage {
        CreateApplicationPackage {
            id,
            if_not_exists: false,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            default_ddl_collation: None,
            comment: None,
            tags: vec![],
            distribution: None,
        }
    }
}

flags!(CreateApplicationPackage { if_not_exists });
setters!(CreateApplicationPackage {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    distribution: Distribution,
});
string_setters!(CreateApplicationPackage { default_ddl_collation, comment });
list_setters!(CreateApplicationPackage { tags: TagAssociation });

impl Render for CreateApplicationPackage {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE APPLICATION PACKAGE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
            )
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .comment(self.comment.as_deref())
            .tags("TAG", &self.tags)
            .opt_param("DISTRIBUTION", self.distribution.map(|d| d.as_str()))
            .finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationPackageSet {
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    default_ddl_collation: Option<String>,
    comment: Option<String>,
    distribution: Option<Distribution>,
}

impl ApplicationPackageSet {
    pub fn new() -> ApplicationPackageSet {
        ApplicationPackageSet::default()
    }
}

setters!(ApplicationPackageSet {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    distribution: Distribution,
});
string_setters!(ApplicationPackageSet { default_ddl_collation, comment });

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationPackageUnset {
    data_retention_time_in_days: bool,
    max_data_extension_time_in_days: bool,
    default_ddl_collation: bool,
    comment: bool,
    distribution: bool,
}

impl ApplicationPackageUnset {
    pub fn new() -> ApplicationPackageUnset {
        ApplicationPackageUnset::default()
    }
}

flags!(ApplicationPackageUnset {
    data_retention_time_in_days,
    max_data_extension_time_in_days,
    default_ddl_collation,
    comment,
    distribution,
});

/// `ADD VERSION [<version>] USING '<stage path>' [LABEL = '...']`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddVersion {
    version_identifier: Option<String>,
    using: String,
    label: Option<String>,
}

impl AddVersion {
    pub fn new(using: impl Into<String>) -> AddVersion {
        AddVersion {
            version_identifier: None,
            using: using.into(),
            label: None,
        }
    }
}

string_setters!(AddVersion { version_identifier, label });

/// `ADD PATCH FOR VERSION <version> USING '<stage path>' [LABEL = '...']`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddPatchForVersion {
    version_identifier: String,
    using: String,
    label: Option<String>,
}

impl AddPatchForVersion {
    pub fn new(version_identifier: impl Into<String>, using: impl Into<String>) -> AddPatchForVersion {
        AddPatchForVersion {
            version_identifier: version_identifier.into(),
            using: using.into(),
            label: None,
        }
    }
}

string_setters!(AddPatchForVersion { label });

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterApplicationPackage {
    id: AccountObjectIdentifier,
    if_exists: bool,
    set: Option<ApplicationPackageSet>,
    unset: Option<ApplicationPackageUnset>,
    add_version: Option<AddVersion>,
    add_patch_for_version: Option<AddPatchForVersion>,
    drop_version: Option<String>,
    set_default_release_directive: Option<(String, u32)>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterApplicationPackage {
    pub fn new(id: AccountObjectIdentifier) -> AlterApplicationPackage {
        AlterApplicationPackage {
            id,
            if_exists: false,
            set: None,
            unset: None,
            add_version: None,
            add_patch_for_version: None,
            drop_version: None,
            set_default_release_directive: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }

    /// `SET DEFAULT RELEASE DIRECTIVE VERSION = <version> PATCH = <patch>`
    pub fn set_default_release_directive(mut self, version: impl Into<String>, patch: u32) -> Self {
        self.set_default_release_directive = Some((version.into(), patch));
        self
    }
}

flags!(AlterApplicationPackage { if_exists });
setters!(AlterApplicationPackage {
    set: ApplicationPackageSet,
    unset: ApplicationPackageUnset,
    add_version: AddVersion,
    add_patch_for_version: AddPatchForVersion,
});
string_setters!(AlterApplicationPackage { drop_version });
list_setters!(AlterApplicationPackage {
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterApplicationPackage {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.set.is_some(),
            self.unset.is_some(),
            self.add_version.is_some(),
            self.add_patch_for_version.is_some(),
            self.drop_version.is_some(),
            self.set_default_release_directive.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER APPLICATION PACKAGE");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER APPLICATION PACKAGE SET",
                &[
                    set.data_retention_time_in_days.is_some(),
                    set.max_data_extension_time_in_days.is_some(),
                    set.default_ddl_collation.is_some(),
                    set.comment.is_some(),
                    set.distribution.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .opt_param("DATA_RETENTION_TIME_IN_DAYS", set.data_retention_time_in_days)
                .opt_param(
                    "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                    set.max_data_extension_time_in_days,
                )
                .string_param("DEFAULT_DDL_COLLATION", set.default_ddl_collation.as_deref())
                .comment(set.comment.as_deref())
                .opt_param("DISTRIBUTION", set.distribution.map(|d| d.as_str()));
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER APPLICATION PACKAGE UNSET",
                &[
                    ("DATA_RETENTION_TIME_IN_DAYS", unset.data_retention_time_in_days),
                    (
                        "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                        unset.max_data_extension_time_in_days,
                    ),
                    ("DEFAULT_DDL_COLLATION", unset.default_ddl_collation),
                    ("COMMENT", unset.comment),
                    ("DISTRIBUTION", unset.distribution),
                ],
            )?;
        }
        if let Some(add) = &self.add_version {
            sql.keyword("ADD VERSION");
            if let Some(version) = &add.version_identifier {
                sql.raw(quote_part(version));
            }
            sql.keyword_string("USING", Some(add.using.as_str()))
                .string_param("LABEL", add.label.as_deref());
        }
        if let Some(patch) = &self.add_patch_for_version {
            sql.keyword("ADD PATCH FOR VERSION")
                .raw(quote_part(&patch.version_identifier))
                .keyword_string("USING", Some(patch.using.as_str()))
                .string_param("LABEL", patch.label.as_deref());
        }
        if let Some(version) = &self.drop_version {
            sql.keyword("DROP VERSION").raw(quote_part(version));
        }
        if let Some((version, patch)) = &self.set_default_release_directive {
            sql.keyword("SET DEFAULT RELEASE DIRECTIVE")
                .param("VERSION", quote_part(version))
                .param("PATCH", patch);
        }
        sql.set_tags(&self.set_tags).unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

/// `SHOW VERSIONS IN APPLICATION PACKAGE <id>`
struct ShowVersions<'a> {
    id: &'a AccountObjectIdentifier,
}

impl Render for ShowVersions<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("SHOW VERSIONS IN APPLICATION PACKAGE")
            .identifier(self.id)
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ApplicationPackages<'a> {
    client: &'a Client,
}

impl Client {
    pub fn application_packages(&self) -> ApplicationPackages<'_> {
        ApplicationPackages { client: self }
    }
}

impl ApplicationPackages<'_> {
    pub async fn create(&self, request: &CreateApplicationPackage) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterApplicationPackage) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("APPLICATION PACKAGE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<ApplicationPackage>> {
        self.client.show("APPLICATION PACKAGES", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<ApplicationPackage> {
        self.client.show_by_id("APPLICATION PACKAGES", id).await
    }

    pub async fn show_versions(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<ApplicationPackageVersion>> {
        self.client.query(&ShowVersions { id }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn id() -> SnowflakeResult<AccountObjectIdentifier> {
        AccountObjectIdentifier::new("PKG")
    }

    #[test]
    fn versions_and_release_directive() -> SnowflakeResult<()> {
        assert_eq!(
            AlterApplicationPackage::new(id()?)
                .add_version(AddVersion::new("@DB.SC.STAGE/v1").version_identifier("V1").label("first"))
                .render()?,
            "ALTER APPLICATION PACKAGE PKG ADD VERSION V1 USING '@DB.SC.STAGE/v1' LABEL = 'first'"
        );
        assert_eq!(
            AlterApplicationPackage::new(id()?)
                .add_patch_for_version(AddPatchForVersion::new("V1", "@DB.SC.STAGE/v1p1"))
                .render()?,
            "ALTER APPLICATION PACKAGE PKG ADD PATCH FOR VERSION V1 USING '@DB.SC.STAGE/v1p1'"
        );
        assert_eq!(
            AlterApplicationPackage::new(id()?).drop_version("v1.0").render()?,
            "ALTER APPLICATION PACKAGE PKG DROP VERSION \"v1.0\""
        );
        assert_eq!(
            AlterApplicationPackage::new(id()?)
                .set_default_release_directive("V1", 2)
                .render()?,
            "ALTER APPLICATION PACKAGE PKG SET DEFAULT RELEASE DIRECTIVE VERSION = V1 PATCH = 2"
        );
        assert_eq!(
            CreateApplicationPackage::new(id()?)
                .distribution(Distribution::Internal)
                .comment("pkg")
                .render()?,
            "CREATE APPLICATION PACKAGE PKG COMMENT = 'pkg' DISTRIBUTION = INTERNAL"
        );
        Ok(())
    }

    #[tokio::test]
    async fn show_versions() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW VERSIONS IN APPLICATION PACKAGE PKG",
            vec![
                Row::new().with("version", "V1").with("patch", "0").with("label", "first"),
                Row::new().with("version", "V1").with("patch", "1"),
            ],
        );
        let versions = Client::new(driver).application_packages().show_versions(&id()?).await?;
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].patch, 1);
        assert_eq!(versions[1].label, None);
        Ok(())
    }
}
