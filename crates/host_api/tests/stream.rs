use host_api::{PushEvent, PushStreamParser};

#[test]
fn framing_parses_updates_removals_and_ignored_names() {
    let payload = concat!(
        "data: {\"type\":\"message.updated\",\"properties\":{\"info\":{\"id\":\"m1\",\"role\":\"user\"}}}\n\n",
        "data: {\"type\":\"session.idle\",\"properties\":{}}\n\n",
        "data: {\"type\":\"message.part.removed\",\"properties\":{\"partID\":\"p9\"}}\n\n"
    );

    let events = PushStreamParser::parse_frames(payload);
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], PushEvent::MessageUpdated { .. }));
    assert!(matches!(
        &events[1],
        PushEvent::Ignored { event_type } if event_type == "session.idle"
    ));
    assert!(matches!(
        &events[2],
        PushEvent::PartRemoved { part_id } if part_id == "p9"
    ));
}

#[test]
fn frames_split_across_reads_are_reassembled() {
    let mut parser = PushStreamParser::default();

    let first = parser.feed(b"data: {\"type\":\"message.removed\",\"prop");
    assert!(first.is_empty());

    let second = parser.feed(b"erties\":{\"messageID\":\"m3\"}}\n\ndata: {\"type\":");
    assert_eq!(second.len(), 1);
    assert!(matches!(
        &second[0],
        PushEvent::MessageRemoved { message_id } if message_id == "m3"
    ));

    let third = parser.feed(b"\"session.idle\",\"properties\":{}}\n\n");
    assert_eq!(third.len(), 1);
    assert!(matches!(third[0], PushEvent::Ignored { .. }));
    assert!(parser.is_empty_buffer());
}

#[test]
fn malformed_frames_are_dropped_without_ending_the_stream() {
    let payload = concat!(
        "data: this is not json\n\n",
        "data: {\"type\":\"message.updated\",\"properties\":{}}\n\n",
        "data: {\"type\":\"message.updated\",\"properties\":{\"info\":{\"id\":\"m2\",\"role\":\"assistant\"}}}\n\n"
    );

    // The garbage frame and the recognized-but-payload-less frame both drop;
    // the stream keeps delivering what follows.
    let events = PushStreamParser::parse_frames(payload);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        PushEvent::MessageUpdated { info } if info.id == "m2"
    ));
}
