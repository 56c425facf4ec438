//! Audit Manager custom controls.
use std::collections::BTreeMap;

use anyhow::Context;
use aws_sdk_auditmanager::types as aws;

use crate::{
    aws::{aws_enum, tag_changes, AwsClient, Present},
    log_update, ApiError, Error, Resource, Result,
};

const RESOURCE_TYPE: &str = "aws_auditmanager_control";

aws_enum! {
    SourceSetUpOption => aws::SourceSetUpOption {
        SystemControlsMapping = "System_Controls_Mapping",
        ProceduralControlsMapping = "Procedural_Controls_Mapping",
    }
}

aws_enum! {
    SourceType => aws::SourceType {
        AwsCloudtrail = "AWS_Cloudtrail",
        AwsConfig = "AWS_Config",
        AwsSecurityHub = "AWS_Security_Hub",
        AwsApiCall = "AWS_API_Call",
        Manual = "MANUAL",
    }
}

aws_enum! {
    SourceFrequency => aws::SourceFrequency {
        Daily = "DAILY",
        Weekly = "WEEKLY",
        Monthly = "MONTHLY",
    }
}

aws_enum! {
    KeywordInputType => aws::KeywordInputType {
        SelectFromList = "SELECT_FROM_LIST",
        UploadFile = "UPLOAD_FILE",
        InputText = "INPUT_TEXT",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceKeyword {
    pub keyword_input_type: KeywordInputType,
    pub keyword_value: String,
}

impl From<&SourceKeyword> for aws::SourceKeyword {
    fn from(value: &SourceKeyword) -> Self {
        aws::SourceKeyword::builder()
            .keyword_input_type(value.keyword_input_type.into())
            .keyword_value(&value.keyword_value)
            .build()
    }
}

impl TryFrom<&aws::SourceKeyword> for SourceKeyword {
    type Error = anyhow::Error;

    fn try_from(value: &aws::SourceKeyword) -> anyhow::Result<Self> {
        Ok(SourceKeyword {
            keyword_input_type: value
                .keyword_input_type()
                .present()
                .context("source keyword missing input type")?
                .try_into()?,
            keyword_value: value
                .keyword_value()
                .present()
                .unwrap_or_default()
                .to_owned(),
        })
    }
}

/// Where the evidence of a control comes from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ControlMappingSource {
    pub source_name: String,
    pub source_description: Option<String>,
    pub source_set_up_option: SourceSetUpOption,
    pub source_type: SourceType,
    pub source_keyword: Option<SourceKeyword>,
    pub source_frequency: Option<SourceFrequency>,
    pub troubleshooting_text: Option<String>,
}

impl ControlMappingSource {
    fn expand_create(&self) -> aws::CreateControlMappingSource {
        aws::CreateControlMappingSource::builder()
            .source_name(&self.source_name)
            .set_source_description(self.source_description.clone())
            .source_set_up_option(self.source_set_up_option.into())
            .source_type(self.source_type.into())
            .set_source_keyword(self.source_keyword.as_ref().map(Into::into))
            .set_source_frequency(self.source_frequency.map(Into::into))
            .set_troubleshooting_text(self.troubleshooting_text.clone())
            .build()
    }

    fn expand(&self, source_id: Option<String>) -> aws::ControlMappingSource {
        aws::ControlMappingSource::builder()
            .set_source_id(source_id)
            .source_name(&self.source_name)
            .set_source_description(self.source_description.clone())
            .source_set_up_option(self.source_set_up_option.into())
            .source_type(self.source_type.into())
            .set_source_keyword(self.source_keyword.as_ref().map(Into::into))
            .set_source_frequency(self.source_frequency.map(Into::into))
            .set_troubleshooting_text(self.troubleshooting_text.clone())
            .build()
    }

    fn flatten(source: &aws::ControlMappingSource) -> anyhow::Result<Self> {
        Ok(ControlMappingSource {
            source_name: source
                .source_name()
                .present()
                .context("mapping source missing name")?
                .to_owned(),
            source_description: source.source_description().present().map(str::to_owned),
            source_set_up_option: source
                .source_set_up_option()
                .present()
                .context("mapping source missing set up option")?
                .try_into()?,
            source_type: source
                .source_type()
                .present()
                .context("mapping source missing type")?
                .try_into()?,
            source_keyword: source
                .source_keyword()
                .present()
                .map(TryInto::try_into)
                .transpose()?,
            source_frequency: source
                .source_frequency()
                .present()
                .map(TryInto::try_into)
                .transpose()?,
            troubleshooting_text: source.troubleshooting_text().present().map(str::to_owned),
        })
    }
}

/// A custom Audit Manager control.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Control {
    pub name: String,
    pub description: Option<String>,
    pub testing_information: Option<String>,
    pub action_plan_title: Option<String>,
    pub action_plan_instructions: Option<String>,
    pub control_mapping_sources: Vec<ControlMappingSource>,
    pub tags: BTreeMap<String, String>,
}

/// Known after creation.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlOutput {
    pub id: String,
    pub arn: String,
    /// Source ids, in the order of [`Control::control_mapping_sources`].
    pub source_ids: Vec<String>,
}

impl Control {
    /// Splits a remote control into its local definition and remote state.
    pub fn flatten(control: &aws::Control) -> anyhow::Result<(Self, ControlOutput)> {
        let sources = control
            .control_mapping_sources()
            .present()
            .unwrap_or_default();
        let local = Control {
            name: control
                .name()
                .present()
                .context("control missing name")?
                .to_owned(),
            description: control.description().present().map(str::to_owned),
            testing_information: control.testing_information().present().map(str::to_owned),
            action_plan_title: control.action_plan_title().present().map(str::to_owned),
            action_plan_instructions: control
                .action_plan_instructions()
                .present()
                .map(str::to_owned),
            control_mapping_sources: sources
                .iter()
                .map(ControlMappingSource::flatten)
                .collect::<anyhow::Result<_>>()?,
            tags: control
                .tags()
                .present()
                .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
        };
        let output = ControlOutput {
            id: control
                .id()
                .present()
                .context("control missing id")?
                .to_owned(),
            arn: control.arn().present().unwrap_or_default().to_owned(),
            source_ids: sources
                .iter()
                .map(|source| source.source_id().present().unwrap_or_default().to_owned())
                .collect(),
        };
        Ok((local, output))
    }

    /// Mapping sources for an update, keeping the ids of sources that
    /// already exist under the same name.
    fn expand_update(
        &self,
        previous_local: &Self,
        previous_remote: &ControlOutput,
    ) -> Vec<aws::ControlMappingSource> {
        self.control_mapping_sources
            .iter()
            .map(|source| {
                let source_id = previous_local
                    .control_mapping_sources
                    .iter()
                    .position(|prev| prev.source_name == source.source_name)
                    .and_then(|i| previous_remote.source_ids.get(i))
                    .filter(|id| !id.is_empty())
                    .cloned();
                source.expand(source_id)
            })
            .collect()
    }

    /// The calls needed to get from `previous` to `self`.
    pub fn plan_update(&self, previous: &Self) -> Vec<UpdateStep> {
        let mut steps = vec![];
        let settings_changed = Control {
            tags: BTreeMap::new(),
            ..self.clone()
        } != Control {
            tags: BTreeMap::new(),
            ..previous.clone()
        };
        if settings_changed {
            steps.push(UpdateStep::UpdateControl);
        }
        if self.tags != previous.tags {
            steps.push(UpdateStep::UpdateTags);
        }
        steps
    }
}

/// One call made while updating a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    UpdateControl,
    UpdateTags,
}

/// Gets a control by id.
pub async fn find_control(client: &AwsClient, id: &str) -> Result<aws::Control> {
    let result = client
        .auditmanager()
        .get_control()
        .control_id(id)
        .send()
        .await
        .map_err(ApiError::from);
    let not_found = || Error::NotFound {
        resource_type: RESOURCE_TYPE,
        id: id.to_owned(),
    };
    match result {
        Ok(out) => out.control().present().cloned().ok_or_else(not_found),
        Err(e) if e.is_not_found() => Err(not_found()),
        Err(source) => Err(Error::Api { source }),
    }
}

/// Deletes a control. Deleting a control that is already gone succeeds.
pub async fn delete_control(client: &AwsClient, id: &str) -> Result<()> {
    log::info!("deleting audit manager control {id}");
    match client
        .auditmanager()
        .delete_control()
        .control_id(id)
        .send()
        .await
        .map_err(ApiError::from)
    {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            log::debug!("audit manager control {id} already gone");
            Ok(())
        }
        Err(source) => Err(Error::Api { source }),
    }
}

async fn update_tags(
    client: &AwsClient,
    arn: &str,
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> anyhow::Result<()> {
    let (set, remove) = tag_changes(old, new);
    if !remove.is_empty() {
        client
            .auditmanager()
            .untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(remove))
            .send()
            .await
            .map_err(ApiError::from)?;
    }
    if !set.is_empty() {
        client
            .auditmanager()
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(set))
            .send()
            .await
            .map_err(ApiError::from)?;
    }
    Ok(())
}

impl Resource for Control {
    type Provider = AwsClient;
    type Error = Error;
    type Output = ControlOutput;

    async fn create(&self, client: &AwsClient) -> Result<ControlOutput> {
        let create = async {
            let out = client
                .auditmanager()
                .create_control()
                .name(&self.name)
                .set_description(self.description.clone())
                .set_testing_information(self.testing_information.clone())
                .set_action_plan_title(self.action_plan_title.clone())
                .set_action_plan_instructions(self.action_plan_instructions.clone())
                .set_control_mapping_sources(Some(
                    self.control_mapping_sources
                        .iter()
                        .map(ControlMappingSource::expand_create)
                        .collect(),
                ))
                .set_tags(if self.tags.is_empty() {
                    None
                } else {
                    Some(self.tags.clone().into_iter().collect())
                })
                .send()
                .await
                .map_err(ApiError::from)?;
            let control = out.control().present().context("missing control")?;
            let (_, output) = Control::flatten(control)?;
            log::info!("created audit manager control {} ({})", self.name, output.id);
            anyhow::Ok(output)
        };
        create.await.map_err(|error| Error::Create {
            name: self.name.clone(),
            error,
        })
    }

    async fn read(
        client: &AwsClient,
        previous_remote: &ControlOutput,
    ) -> Result<(Self, ControlOutput)> {
        let control = find_control(client, &previous_remote.id).await?;
        Control::flatten(&control).map_err(|error| Error::Read {
            name: previous_remote.id.clone(),
            error,
        })
    }

    async fn update(
        &self,
        client: &AwsClient,
        previous_local: &Self,
        previous_remote: &ControlOutput,
    ) -> Result<ControlOutput> {
        if self == previous_local {
            log::debug!("audit manager control {} unchanged", self.name);
            return Ok(previous_remote.clone());
        }
        log_update(&self.name, previous_local, self);
        let update = async {
            let mut output = previous_remote.clone();
            for step in self.plan_update(previous_local) {
                log::debug!("audit manager control {}: {step:?}", previous_remote.id);
                match step {
                    UpdateStep::UpdateControl => {
                        let out = client
                            .auditmanager()
                            .update_control()
                            .control_id(&previous_remote.id)
                            .name(&self.name)
                            .set_description(self.description.clone())
                            .set_testing_information(self.testing_information.clone())
                            .set_action_plan_title(self.action_plan_title.clone())
                            .set_action_plan_instructions(self.action_plan_instructions.clone())
                            .set_control_mapping_sources(Some(
                                self.expand_update(previous_local, previous_remote),
                            ))
                            .send()
                            .await
                            .map_err(ApiError::from)?;
                        let control = out.control().present().context("missing control")?;
                        (_, output) = Control::flatten(control)?;
                    }
                    UpdateStep::UpdateTags => {
                        update_tags(client, &output.arn, &previous_local.tags, &self.tags).await?
                    }
                }
            }
            anyhow::Ok(output)
        };
        update.await.map_err(|error| Error::Update {
            name: self.name.clone(),
            error,
        })
    }

    async fn delete(&self, client: &AwsClient, previous_remote: &ControlOutput) -> Result<()> {
        delete_control(client, &previous_remote.id)
            .await
            .map_err(|e| Error::Destroy {
                name: self.name.clone(),
                error: e.into(),
            })
    }

    async fn import(client: &AwsClient, id: &str) -> Result<(Self, ControlOutput)> {
        let control = find_control(client, id).await?;
        Control::flatten(&control).map_err(|error| Error::Read {
            name: id.to_owned(),
            error,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manual_source(name: &str) -> ControlMappingSource {
        ControlMappingSource {
            source_name: name.to_owned(),
            source_description: Some("checked by hand".to_owned()),
            source_set_up_option: SourceSetUpOption::ProceduralControlsMapping,
            source_type: SourceType::Manual,
            source_keyword: None,
            source_frequency: None,
            troubleshooting_text: None,
        }
    }

    fn config_source(name: &str) -> ControlMappingSource {
        ControlMappingSource {
            source_name: name.to_owned(),
            source_description: None,
            source_set_up_option: SourceSetUpOption::SystemControlsMapping,
            source_type: SourceType::AwsConfig,
            source_keyword: Some(SourceKeyword {
                keyword_input_type: KeywordInputType::SelectFromList,
                keyword_value: "s3-bucket-public-read-prohibited".to_owned(),
            }),
            source_frequency: Some(SourceFrequency::Daily),
            troubleshooting_text: Some("enable the rule".to_owned()),
        }
    }

    #[test]
    fn expand_then_flatten_has_no_drift() {
        let local = Control {
            name: "tf-acc-test-control".to_owned(),
            description: Some("a test control".to_owned()),
            testing_information: None,
            action_plan_title: Some("fix it".to_owned()),
            action_plan_instructions: None,
            control_mapping_sources: vec![manual_source("manual"), config_source("config")],
            tags: BTreeMap::from([("key1".to_owned(), "value1".to_owned())]),
        };
        let remote = aws::Control::builder()
            .id("c-1")
            .arn("arn:aws:auditmanager:us-west-2:123456789012:control/c-1")
            .name(&local.name)
            .set_description(local.description.clone())
            .set_action_plan_title(local.action_plan_title.clone())
            .control_mapping_sources(local.control_mapping_sources[0].expand(Some("s-1".to_owned())))
            .control_mapping_sources(local.control_mapping_sources[1].expand(Some("s-2".to_owned())))
            .tags("key1", "value1")
            .build();

        let (flattened, output) = Control::flatten(&remote).unwrap();
        pretty_assertions::assert_eq!(local, flattened);
        assert_eq!("c-1", output.id);
        assert_eq!(vec!["s-1", "s-2"], output.source_ids);
    }

    #[test]
    fn update_keeps_source_ids_by_name() {
        let previous = Control {
            name: "control".to_owned(),
            control_mapping_sources: vec![manual_source("a"), manual_source("b")],
            ..Default::default()
        };
        let remote = ControlOutput {
            id: "c-1".to_owned(),
            arn: "arn".to_owned(),
            source_ids: vec!["s-a".to_owned(), "s-b".to_owned()],
        };
        let next = Control {
            control_mapping_sources: vec![manual_source("b"), config_source("c")],
            ..previous.clone()
        };
        let sources = next.expand_update(&previous, &remote);
        let ids = sources
            .iter()
            .map(|s| s.source_id().present().map(str::to_owned))
            .collect::<Vec<_>>();
        assert_eq!(vec![Some("s-b".to_owned()), None], ids);
    }

    #[test]
    fn unchanged_control_needs_no_calls() {
        let control = Control {
            name: "control".to_owned(),
            control_mapping_sources: vec![manual_source("a")],
            ..Default::default()
        };
        assert!(control.plan_update(&control.clone()).is_empty());
    }

    #[test]
    fn tags_change_only_tags() {
        let previous = Control {
            name: "control".to_owned(),
            control_mapping_sources: vec![manual_source("a")],
            ..Default::default()
        };
        let next = Control {
            tags: BTreeMap::from([("key1".to_owned(), "value1".to_owned())]),
            ..previous.clone()
        };
        pretty_assertions::assert_eq!(vec![UpdateStep::UpdateTags], next.plan_update(&previous));
    }

    #[test]
    fn settings_change_updates_the_control() {
        let previous = Control {
            name: "control".to_owned(),
            control_mapping_sources: vec![manual_source("a")],
            tags: BTreeMap::from([("key1".to_owned(), "value1".to_owned())]),
            ..Default::default()
        };
        let next = Control {
            control_mapping_sources: vec![manual_source("a"), config_source("b")],
            ..previous.clone()
        };
        pretty_assertions::assert_eq!(vec![UpdateStep::UpdateControl], next.plan_update(&previous));

        let next = Control {
            description: Some("updated".to_owned()),
            tags: BTreeMap::new(),
            ..previous.clone()
        };
        pretty_assertions::assert_eq!(
            vec![UpdateStep::UpdateControl, UpdateStep::UpdateTags],
            next.plan_update(&previous)
        );
    }

    #[test]
    fn unknown_source_type_is_an_error() {
        let source = aws::ControlMappingSource::builder()
            .source_name("x")
            .source_set_up_option(aws::SourceSetUpOption::from("System_Controls_Mapping"))
            .source_type(aws::SourceType::from("SOMETHING_NEW"))
            .build();
        assert!(ControlMappingSource::flatten(&source).is_err());
    }

    #[tokio::test]
    async fn acceptance_lifecycle() {
        let _ = env_logger::builder().is_test(true).try_init();
        if crate::acctest::skip("acceptance_lifecycle") {
            return;
        }
        let region = crate::config::DEFAULT_REGION;
        let client = AwsClient::load(region, None).await.unwrap();
        let mut control = Control {
            name: crate::acctest::random_name(),
            description: Some("telesweep acceptance test".to_owned()),
            control_mapping_sources: vec![manual_source("manual")],
            ..Default::default()
        };
        let output = match control.create(&client).await {
            Ok(output) => output,
            Err(e) if crate::acctest::pre_check_skip("acceptance_lifecycle", &e) => return,
            Err(e) => panic!("{e}"),
        };

        let (read, _) = Control::read(&client, &output).await.unwrap();
        assert_eq!(control, read);

        let previous = control.clone();
        control.description = Some("updated".to_owned());
        control.tags.insert("key1".to_owned(), "value1".to_owned());
        let output = control.update(&client, &previous, &output).await.unwrap();
        let (imported, _) = Control::import(&client, &output.id).await.unwrap();
        assert_eq!(control, imported);

        control.delete(&client, &output).await.unwrap();
        // A second delete finds nothing and still succeeds.
        control.delete(&client, &output).await.unwrap();
        let err = Control::read(&client, &output).await.unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }
}
