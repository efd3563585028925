// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

// Note: any changes to the template must be reflected in the appropriate structs.
pub(crate) const CONFIG_TEMPLATE: &str = r#"
# This is a TOML config file.
# For more information, see https://github.com/toml-lang/toml

[credentials]
# Password protecting generated keystore files. The same value is used to unlock
# accounts on nodes that require runtime unlocking.
key_password = {{ toml_string credentials.key_password }}

# Number of pbkdf2 rounds used when encrypting keystore v3 wallet files.
keystore_kdf_rounds = {{ credentials.keystore_kdf_rounds }}

[images]
geth = {{ toml_string images.geth }}
quorum = {{ toml_string images.quorum }}
tessera = {{ toml_string images.tessera }}
fabric_tools = {{ toml_string images.fabric_tools }}
utility = {{ toml_string images.utility }}

[retry]
# Number of additional attempts made when unlocking an account on a freshly started node.
unlock_retries = {{ retry.unlock_retries }}

# Number of additional attempts made when waiting on a service to become available.
generic_retries = {{ retry.generic_retries }}

# Fixed delay between two consecutive attempts.
delay = {{ toml_string retry.delay }}

# Interval and number of polls made while waiting for a transaction receipt.
receipt_poll_interval = {{ toml_string retry.receipt_poll_interval }}
receipt_poll_retries = {{ retry.receipt_poll_retries }}
"#;
