//! MediaLive sweepers.
use aws_sdk_medialive::types::ChannelSummary;

use crate::{
    aws::{AwsClient, Present},
    ApiError, Id, Page, Result, Sweepable,
};

pub struct Channels;

impl Sweepable for Channels {
    type Client = AwsClient;
    type Summary = ChannelSummary;
    type Identity = Id;

    const NAME: &'static str = "aws_medialive_channel";
    const DESCRIPTION: &'static str = "MediaLive Channels";

    async fn list_page(
        client: &AwsClient,
        next: Option<String>,
    ) -> Result<Page<Self::Summary>, ApiError> {
        let out = client
            .medialive()
            .list_channels()
            .set_next_token(next)
            .send()
            .await?;
        Ok(Page::new(
            out.channels().present().unwrap_or_default().to_vec(),
            out.next_token().present().map(str::to_owned),
        ))
    }

    fn describe(summary: &ChannelSummary) -> Option<Id> {
        summary
            .id()
            .present()
            .filter(|id| !id.is_empty())
            .map(Id::new)
    }

    async fn delete(client: &AwsClient, identity: &Id) -> Result<()> {
        super::channel::delete_channel(client, &identity.id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channels_are_identified_by_id() {
        let summary = ChannelSummary::builder().id("1234567").name("x").build();
        assert_eq!(Some(Id::new("1234567")), Channels::describe(&summary));
        assert!(Channels::describe(&ChannelSummary::builder().build()).is_none());
        assert!(Channels::DEPENDENCIES.is_empty());
    }
}
