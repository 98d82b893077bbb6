/*!
 * # Session Credentials
 *
 * The storefront authenticates with a short-lived access token and a
 * longer-lived refresh token. This module owns where those two strings live
 * between requests:
 *
 * - [`InMemoryTokenStore`] for embedded use and tests
 * - [`FileTokenStore`] for the CLI, persisting a JSON session file
 *
 * Exchanging the refresh token for a new access token is done by the HTTP
 * client, which writes the result back through [`TokenStore`].
 */

mod token_store;

pub use token_store::*;
