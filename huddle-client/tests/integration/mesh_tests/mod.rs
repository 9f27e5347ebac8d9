mod test_responder_path;
mod test_stalled_negotiation;
mod test_teardown;
