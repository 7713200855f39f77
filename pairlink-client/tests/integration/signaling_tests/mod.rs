mod test_sessions_negotiate_through_server;
