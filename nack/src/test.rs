use std::time::Duration;

use crate::generator::NackGeneratorBuilder;

#[tokio::test]
async fn reports_a_nack_for_a_simple_gap() {
    let gen = NackGeneratorBuilder::new().build(1, 2);
    for seq in [10u16, 11, 12, 14, 16, 18, 19] {
        gen.push(seq).await;
    }
    gen.set_rtt(Duration::from_millis(20)).await;

    let nack = gen.force_check().await.expect("gap should produce a nack");
    assert_eq!(nack.sender_ssrc, 1);
    assert_eq!(nack.media_ssrc, 2);
    assert_eq!(nack.nacks.len(), 1);
    assert_eq!(nack.nacks[0].packet_id, 13);
    assert_eq!(nack.nacks[0].lost_packets, 0b1010);
}

#[tokio::test]
async fn late_arrival_clears_the_loss() {
    let gen = NackGeneratorBuilder::new().build(1, 2);
    for seq in [10u16, 12] {
        gen.push(seq).await;
    }
    gen.push(11).await;

    assert!(gen.force_check().await.is_none());
}

#[tokio::test]
async fn retry_is_throttled_by_rtt() {
    let gen = NackGeneratorBuilder::new().build(1, 2);
    gen.push(10).await;
    gen.push(12).await;
    gen.set_rtt(Duration::from_millis(20)).await;

    assert!(gen.force_check().await.is_some(), "first check should request 11");
    assert!(
        gen.force_check().await.is_none(),
        "retry before the rtt has elapsed should not re-request"
    );

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert!(
        gen.force_check().await.is_some(),
        "retry after the rtt has elapsed should re-request"
    );
}

#[tokio::test]
async fn retry_stops_after_max_retries() {
    let gen = NackGeneratorBuilder::new()
        .with_max_retries(1)
        .build(1, 2);
    gen.push(10).await;
    gen.push(12).await;
    gen.set_rtt(Duration::from_millis(1)).await;

    assert!(gen.force_check().await.is_some());
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(
        gen.force_check().await.is_none(),
        "sequence number should stop being retried past max_retries"
    );
}

#[tokio::test]
async fn skip_last_n_withholds_the_trailing_edge() {
    let gen = NackGeneratorBuilder::new().with_skip_last_n(2).build(1, 2);
    gen.push(10).await;
    gen.push(12).await;

    assert!(
        gen.force_check().await.is_none(),
        "11 is within skip_last_n of the window edge and should not be reported yet"
    );
}
