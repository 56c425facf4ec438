//! Audit Manager sweepers.
use aws_sdk_auditmanager::types::{
    AssessmentFrameworkMetadata, AssessmentFrameworkShareRequest, AssessmentMetadataItem,
    AssessmentReportMetadata, ControlMetadata, ControlType, DelegationMetadata, FrameworkType,
    ShareRequestType,
};

use super::is_complete_setup_error;
use crate::{
    self as sweep,
    aws::{AwsClient, Present},
    ApiError, Id, Identity, Page, Result, Sweepable,
};

fn next_token<'a>(token: impl Present<&'a str>) -> Option<String> {
    token.present().map(str::to_owned)
}

fn id<'a>(id: impl Present<&'a str>) -> Option<Id> {
    id.present().filter(|id| !id.is_empty()).map(Id::new)
}

pub struct Assessments;

impl Sweepable for Assessments {
    type Client = AwsClient;
    type Summary = AssessmentMetadataItem;
    type Identity = Id;

    const NAME: &'static str = "aws_auditmanager_assessment";
    const DESCRIPTION: &'static str = "AuditManager Assessments";
    const DEPENDENCIES: &'static [&'static str] = &[
        "aws_auditmanager_control",
        "aws_auditmanager_framework",
        "aws_iam_role",
        "aws_s3_bucket",
    ];

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .list_assessments()
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.assessment_metadata()
                .present()
                .unwrap_or_default()
                .to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<Id> {
        id(summary.id())
    }

    async fn delete(client: &AwsClient, identity: &Id) -> Result<()> {
        client
            .auditmanager()
            .delete_assessment()
            .assessment_id(&identity.id)
            .send()
            .await?;
        Ok(())
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

/// Identity of a delegation within an assessment.
#[derive(Clone, Debug, PartialEq, Eq, Identity)]
pub struct DelegationId {
    pub assessment_id: String,
    pub delegation_id: String,
}

pub struct AssessmentDelegations;

impl Sweepable for AssessmentDelegations {
    type Client = AwsClient;
    type Summary = DelegationMetadata;
    type Identity = DelegationId;

    const NAME: &'static str = "aws_auditmanager_assessment_delegation";
    const DESCRIPTION: &'static str = "AuditManager Assessment Delegations";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .get_delegations()
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.delegations().present().unwrap_or_default().to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<DelegationId> {
        Some(DelegationId {
            assessment_id: id(summary.assessment_id())?.id,
            delegation_id: id(summary.id())?.id,
        })
    }

    async fn delete(client: &AwsClient, identity: &DelegationId) -> Result<()> {
        let out = client
            .auditmanager()
            .batch_delete_delegation_by_assessment()
            .assessment_id(&identity.assessment_id)
            .delegation_ids(&identity.delegation_id)
            .send()
            .await?;
        // Failures come back in the response rather than as an error.
        match out.errors().present().unwrap_or_default().first() {
            None => Ok(()),
            Some(e) => Err(ApiError::service(
                e.error_code().present().unwrap_or("Unknown"),
                e.error_message().present().unwrap_or_default(),
            )
            .into()),
        }
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

/// Identity of an assessment report.
#[derive(Clone, Debug, PartialEq, Eq, Identity)]
pub struct ReportId {
    pub id: String,
    pub assessment_id: String,
}

pub struct AssessmentReports;

impl Sweepable for AssessmentReports {
    type Client = AwsClient;
    type Summary = AssessmentReportMetadata;
    type Identity = ReportId;

    const NAME: &'static str = "aws_auditmanager_assessment_report";
    const DESCRIPTION: &'static str = "AuditManager Assessment Reports";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .list_assessment_reports()
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.assessment_reports()
                .present()
                .unwrap_or_default()
                .to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<ReportId> {
        Some(ReportId {
            id: id(summary.id())?.id,
            assessment_id: id(summary.assessment_id())?.id,
        })
    }

    async fn delete(client: &AwsClient, identity: &ReportId) -> Result<()> {
        client
            .auditmanager()
            .delete_assessment_report()
            .assessment_id(&identity.assessment_id)
            .assessment_report_id(&identity.id)
            .send()
            .await?;
        Ok(())
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

pub struct Controls;

impl Sweepable for Controls {
    type Client = AwsClient;
    type Summary = ControlMetadata;
    type Identity = Id;

    const NAME: &'static str = "aws_auditmanager_control";
    const DESCRIPTION: &'static str = "AuditManager Controls";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .list_controls()
            .control_type(ControlType::Custom)
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.control_metadata_list()
                .present()
                .unwrap_or_default()
                .to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<Id> {
        id(summary.id())
    }

    async fn delete(client: &AwsClient, identity: &Id) -> Result<()> {
        super::control::delete_control(client, &identity.id).await
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

pub struct Frameworks;

impl Sweepable for Frameworks {
    type Client = AwsClient;
    type Summary = AssessmentFrameworkMetadata;
    type Identity = Id;

    const NAME: &'static str = "aws_auditmanager_framework";
    const DESCRIPTION: &'static str = "AuditManager Frameworks";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .list_assessment_frameworks()
            .framework_type(FrameworkType::Custom)
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.framework_metadata_list()
                .present()
                .unwrap_or_default()
                .to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<Id> {
        id(summary.id())
    }

    async fn delete(client: &AwsClient, identity: &Id) -> Result<()> {
        client
            .auditmanager()
            .delete_assessment_framework()
            .framework_id(&identity.id)
            .send()
            .await?;
        Ok(())
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

pub struct FrameworkShares;

impl Sweepable for FrameworkShares {
    type Client = AwsClient;
    type Summary = AssessmentFrameworkShareRequest;
    type Identity = Id;

    const NAME: &'static str = "aws_auditmanager_framework_share";
    const DESCRIPTION: &'static str = "AuditManager Framework Shares";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .auditmanager()
            .list_assessment_framework_share_requests()
            .request_type(ShareRequestType::Sent)
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.assessment_framework_share_requests()
                .present()
                .unwrap_or_default()
                .to_vec(),
            next_token(out.next_token()),
        ))
    }

    fn describe(summary: &Self::Summary) -> Option<Id> {
        id(summary.id())
    }

    async fn delete(client: &AwsClient, identity: &Id) -> Result<()> {
        client
            .auditmanager()
            .delete_assessment_framework_share()
            .request_id(&identity.id)
            .request_type(ShareRequestType::Sent)
            .send()
            .await?;
        Ok(())
    }

    fn is_service_not_enabled(error: &ApiError) -> bool {
        is_complete_setup_error(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delegations_need_both_ids() {
        let complete = DelegationMetadata::builder()
            .id("d-1")
            .assessment_id("a-1")
            .build();
        let identity = AssessmentDelegations::describe(&complete).unwrap();
        assert_eq!(
            "assessment_id=a-1, delegation_id=d-1",
            identity.attributes().to_string()
        );

        let orphan = DelegationMetadata::builder().id("d-2").build();
        assert!(AssessmentDelegations::describe(&orphan).is_none());
    }

    #[test]
    fn reports_are_identified_by_report_then_assessment() {
        let report = AssessmentReportMetadata::builder()
            .id("r-1")
            .assessment_id("a-1")
            .build();
        assert_eq!(
            "id=r-1, assessment_id=a-1",
            AssessmentReports::describe(&report)
                .unwrap()
                .attributes()
                .to_string()
        );
    }

    #[test]
    fn controls_without_id_are_skipped() {
        assert!(Controls::describe(&ControlMetadata::builder().build()).is_none());
        assert_eq!(
            Some(Id::new("c-1")),
            Controls::describe(&ControlMetadata::builder().id("c-1").build())
        );
    }

    #[test]
    fn all_share_the_setup_rule() {
        let setup = ApiError::service("AccessDeniedException", "Please complete AWS Audit Manager setup");
        assert!(Assessments::is_service_not_enabled(&setup));
        assert!(FrameworkShares::is_service_not_enabled(&setup));
        assert!(!Frameworks::is_service_not_enabled(&ApiError::service(
            "InternalServerException",
            ""
        )));
    }
}
