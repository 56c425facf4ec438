use crate::{
    acctest,
    aws::{medialive::channel::test::basic, AwsClient},
    config::DEFAULT_REGION,
    Resource,
};

use super::Channel;

struct Fixtures {
    role_arn: String,
    input_id: String,
    bucket: String,
}

fn fixtures() -> Option<Fixtures> {
    Some(Fixtures {
        role_arn: acctest::fixture("SWEEP_ACC_MEDIALIVE_ROLE_ARN")?,
        input_id: acctest::fixture("SWEEP_ACC_MEDIALIVE_INPUT_ID")?,
        bucket: acctest::fixture("SWEEP_ACC_MEDIALIVE_BUCKET")?,
    })
}

async fn setup(test: &str) -> Option<(AwsClient, Channel)> {
    let _ = env_logger::builder().is_test(true).try_init();
    if acctest::skip(test) {
        return None;
    }
    let fixtures = fixtures()?;
    let client = AwsClient::load(DEFAULT_REGION, None).await.unwrap();
    let channel = basic(
        &acctest::random_name(),
        &fixtures.role_arn,
        &fixtures.input_id,
        &fixtures.bucket,
    );
    Some((client, channel))
}

#[tokio::test]
async fn channel_basic() {
    let Some((client, channel)) = setup("channel_basic").await else {
        return;
    };
    let output = match channel.create(&client).await {
        Ok(output) => output,
        Err(e) if acctest::pre_check_skip("channel_basic", &e) => return,
        Err(e) => panic!("{e}"),
    };
    assert_eq!("IDLE", output.state);
    assert!(output.arn.starts_with("arn:"), "{}", output.arn);

    let (read, _) = Channel::read(&client, &output).await.unwrap();
    pretty_assertions::assert_eq!(channel, read);

    channel.delete(&client, &output).await.unwrap();
    let err = Channel::read(&client, &output).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn channel_start_stop_and_tags() {
    let Some((client, mut channel)) = setup("channel_start_stop_and_tags").await else {
        return;
    };
    channel.tags.insert("key1".to_owned(), "value1".to_owned());
    let output = match channel.create(&client).await {
        Ok(output) => output,
        Err(e) if acctest::pre_check_skip("channel_start_stop_and_tags", &e) => return,
        Err(e) => panic!("{e}"),
    };

    let previous = channel.clone();
    channel.start_channel = true;
    let output = channel.update(&client, &previous, &output).await.unwrap();
    assert_eq!("RUNNING", output.state);

    let previous = channel.clone();
    channel.start_channel = false;
    channel.tags.remove("key1");
    channel.tags.insert("key2".to_owned(), "value2".to_owned());
    let output = channel.update(&client, &previous, &output).await.unwrap();
    assert_eq!("IDLE", output.state);

    let (imported, _) = Channel::import(&client, &output.channel_id).await.unwrap();
    pretty_assertions::assert_eq!(channel, imported);

    channel.delete(&client, &output).await.unwrap();
    // Already gone.
    channel.delete(&client, &output).await.unwrap();
}
